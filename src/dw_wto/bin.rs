use absint::prelude::AbsintResult;
use absint::{cli, dw_wto};

fn main() -> AbsintResult<()> {
    let args = cli::wto().get_matches();
    dw_wto::run(&args)
}

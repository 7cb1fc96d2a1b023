use absint::prelude::AbsintResult;
use absint::{cli, dw_parse};

fn main() -> AbsintResult<()> {
    let args = cli::parse().get_matches();
    dw_parse::run(&args)
}

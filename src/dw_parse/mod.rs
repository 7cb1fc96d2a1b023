use crate::prelude::*;
use clap::ArgMatches;

pub fn run(args: &ArgMatches) -> AbsintResult<()> {
    init_logger(args);

    let text = args
        .get_one::<String>("expr")
        .ok_or_else(|| AbsintError::BadArguments("--expr needed".to_string()))?;
    let (exprs, diagnostic) = normalize(text);
    for expr in exprs {
        println!("{expr}");
    }
    if let Some(diagnostic) = diagnostic {
        eprintln!("{diagnostic}");
    }

    Ok(())
}

/// Reads every expression of `text`, stopping at the first error, and returns
/// their printed forms along with the reader diagnostic if it failed.
pub fn normalize(text: &str) -> (Vec<String>, Option<String>) {
    let mut reader = SexprReader::new(text);
    let exprs = reader.by_ref().map(|expr| expr.to_string()).collect();
    let diagnostic = reader.fail().then(|| reader.what());
    (exprs, diagnostic)
}

//! # `absint`
//!
//! `absint` is the main crate of a toolset for building static analyzers by
//! abstract interpretation. The project is subdivided into multiple crates,
//! `absint` acts as entry point by reexporting important structs and
//! functions from those sub-crates. Most of the reexport are done within the
//! `absint::prelude` namespace.
//!
//! ## Library basics
//!
//! An analysis iterates an abstract domain along a weak topological ordering
//! of the analyzed graph. Both can be used on their own:
//!
//! ```rust
//! use absint::prelude::*;
//!
//! let succs = |n: u32| match n {
//!     1 => vec![2],
//!     2 => vec![3],
//!     3 => vec![2, 4],
//!     _ => vec![],
//! };
//! let wto = WeakTopologicalOrdering::new(1, succs);
//! assert_eq!(wto.to_string(), "1 (2 3) 4");
//!
//! let mut x = IntervalDomain::<i32>::singleton(0)?;
//! x.widen_with(&IntervalDomain::finite(0, 1)?);
//! assert_eq!(x, IntervalDomain::bounded_below(0)?);
//! # Ok::<(), AbsintError>(())
//! ```
//!
//! The [`analysis`] crate documentation shows how to plug a transformer in a
//! fixpoint iterator.
//!
//! ## Sub-crates
//!
//! The project is divided into several crates. Some of them are (completely
//! or partially) re-exported as parts of [`prelude`], but some features may be
//! accessible only by importing a given sub-crate. Here is a list of those
//! sub-crates:
//!
//!  - [`dw_domains`] contains the lattice interface, the base domains, the
//!    domain combinators and the persistent maps and sets they are built on,
//!  - [`dw_analysis`] contains the weak topological ordering and the fixpoint
//!    iterators, and relies on the previously cited crate,
//!  - [`dw_sexpr`] contains the s-expressions reader and printer,
//!  - [`dw_utils`] contains the work queue the parallel iterator runs on.

mod errors;

pub mod cli;
pub mod dw_parse;
pub mod dw_wto;

pub use dw_analysis as analysis;
pub use dw_domains as domains;
pub use dw_sexpr as sexpr;
pub use dw_utils as utils;

/// Reexport module of commonly used structures and functions from the project
/// sub-crates:
///
/// ```rust
/// use absint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{AbsintError, AbsintResult};

    pub use dw_analysis::prelude::*;

    pub use dw_domains::prelude::*;

    pub use dw_sexpr::{Pattern, Sexpr, SexprError, SexprReader};

    pub use dw_utils::workqueue::{Runner, WorkQueueOptions};

    use clap::ArgMatches;

    pub fn init_logger(args: &ArgMatches) {
        let env = env_logger::Env::new()
            .filter_or("DW_LOG", "info")
            .write_style("DW_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if args.get_flag("verbose") {
            builder.filter_level(log::LevelFilter::Trace);
        } else if args.get_flag("debug") {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if args.get_flag("ecslog") {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }
}

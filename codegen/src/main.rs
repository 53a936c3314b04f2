//! Generate `pgresult/src/errcode/generated.rs` from `errcodes.txt`.
//!
//! ```sh
//! cargo run -p codegen [OUTPUT]
//! ```
use anyhow::Context;

mod errcode;

const ERRCODES: &str = include_str!("../errcodes.txt");
const OUTPUT: &str = "pgresult/src/errcode/generated.rs";

fn main() -> anyhow::Result<()> {
    let output = std::env::args().nth(1).unwrap_or_else(|| OUTPUT.to_owned());
    let errcodes = errcode::parse(ERRCODES)?;
    let source = errcode::render(&errcodes);
    std::fs::write(&output, source).with_context(|| format!("failed to write `{output}`"))?;
    println!("{} error class(es) written to {output}", errcodes.len());
    Ok(())
}

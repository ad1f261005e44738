use super::super::args::RenderArgs;
use crate::exit_codes::SUCCESS;
use crate::io::{read_rows, with_language_names};
use anyhow::Context;
use llemba_core::template::lookup;

/// Prints each rendered prompt as a JSON string, one per line.
pub fn run(args: RenderArgs) -> anyhow::Result<i32> {
    let template = lookup(&args.input.method)?;
    let records = read_rows(&args.input.input)?;

    for (i, record) in records.iter().enumerate() {
        let row = if args.input.keep_lang_codes {
            record.row.clone()
        } else {
            with_language_names(&record.row)
        };
        let prompt = template
            .render(&row)
            .with_context(|| format!("row {}", i + 1))?;
        println!("{}", serde_json::to_string(&prompt)?);
    }
    Ok(SUCCESS)
}

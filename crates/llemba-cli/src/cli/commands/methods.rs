use crate::exit_codes::SUCCESS;
use llemba_core::template::methods;

pub fn run() -> anyhow::Result<i32> {
    println!("METHOD               PARSER   REFERENCE MAX_TOKENS");
    for t in methods() {
        println!(
            "{:<20} {:<8} {:<9} {}",
            t.name,
            t.parser.name(),
            if t.uses_reference { "yes" } else { "no" },
            t.max_tokens
        );
    }
    Ok(SUCCESS)
}

/// Utility functions for user interaction at the command line.
use crate::error::Result;
use std::io::{self, Write};

/// Prompt user for confirmation before an irreversible remote deletion.
pub fn confirm_deletion(kind: &str, ids: &[String], force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }

    println!("About to permanently delete {} {kind}(s):", ids.len());
    for id in ids.iter().take(5) {
        println!("  {id}");
    }
    if ids.len() > 5 {
        println!("  ... and {} more", ids.len() - 5);
    }

    print!("This cannot be undone. Continue? (y/N): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

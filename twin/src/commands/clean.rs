// twin/src/commands/clean.rs
//
// USE CASE: Remove the generated twin directory.

use std::path::PathBuf;

use twin_core::application::clean_output;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    match clean_output(&project_dir) {
        Ok(Some(path)) => println!("✨ Removed {}", path.display()),
        Ok(None) => println!("✨ Nothing to clean"),
        Err(e) => {
            eprintln!("❌ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

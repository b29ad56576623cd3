//! `isyntax-natives platform` command

use anyhow::Result;

use super::Global;
use isyntax_natives::core::Platform;

pub fn execute(global: &Global) -> Result<()> {
    let platform = match &global.platform {
        Some(id) => Platform::parse(id)?,
        None => Platform::detect(),
    };

    if global.shell.is_verbose() {
        global.shell.note(format!(
            "host reports {}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ));
        global.shell.note(format!(
            "library files: {}",
            platform.shared_library_names("isyntax").join(", ")
        ));
    }

    println!("{}", platform.classifier());
    Ok(())
}

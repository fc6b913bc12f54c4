use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r##"[directory]
# Id of the person writing; they are never offered as a suggestion.
# current_user = "u-1"

# Staff list: a JSON array of {"id", "name", "email", "role"} records,
# or an object with the array under "data". Relative to this file.
staff_file = "staff.json"

# Role label for records without one.
fallback_role = "STAFF"

# --- UI Customization ---
# Uncomment and edit to override defaults.

[ui]
# max_visible = 8
#
# [ui.colors]
# background = "#0C001B"
# field_text = "#B0AAFF"
# field_border = "#FB4196"
# status = "#7D78BF"
# status_error = "#FF4444"
# popup_border = "#7D78BF"
# suggestion = "#B0AAFF"
# selected_suggestion = "#FFFFFF"
# selected_bg = "#3D1438"
# role_label = "#7D78BF"
"##;

/// Write the starter config into `dir`. Refuses to overwrite unless `force`.
fn write_config(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", CONFIG_FILE).into());
    }
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(path)
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let path = write_config(&cwd, args.force)?;
    println!("Wrote {}", path.display());
    Ok(())
}

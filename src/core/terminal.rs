use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {}: {}", style(label).bold().cyan(), msg);
}

pub fn print_banner() {
    println!();
    println!(
        "{}",
        style("=== Farm Incident Response CLI ===").bold().cyan()
    );
    println!(
        "{}",
        style("Type an incident or sensor message; press Enter on a blank line to quit.").dim()
    );
    println!(
        "{}",
        style("Example: Grain bin 7 temperature increased by 12C in the last 24 hours.").dim()
    );
    println!();
}

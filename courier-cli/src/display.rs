//! Terminal output helpers.

use console::style;

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

pub fn info(msg: &str) {
    println!("{}", style(msg).dim());
}

pub fn warning(msg: &str) {
    println!("{} {}", style("!").yellow(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

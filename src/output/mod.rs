mod progress;
mod render;
mod styling;
mod tables;

pub use progress::RequestProgress;
pub use render::OutputSettings;
pub use styling::{cyan_bold, dim};
pub use tables::{column, Column};

/// Prints the azdo banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        cyan_bold("azdo"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Azure DevOps REST client")
    );
}

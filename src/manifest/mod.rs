pub mod pubspec;
pub mod version_editor;

pub use pubspec::{FLUTTER_DEPENDENCY, PUBSPEC_FILE, Pubspec, parse_pubspec};
pub use version_editor::{replace_version, update_version};

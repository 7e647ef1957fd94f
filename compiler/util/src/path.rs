use std::path::{Component, Path};

/// The last two components of `path` (`dir/file.mal`), used to identify a
/// listing in diagnostics without leaking the whole path.
pub fn get_visible_path(path: &Path) -> String {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    let mut components = path
        .components()
        .rev()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .take(2)
        .collect::<Vec<_>>();

    components.reverse();

    if components.is_empty() {
        String::from("<unknown>")
    } else {
        components.join("/")
    }
}

//! Translating Jenkins names into URL path segments

/// Splits a full item name into its folder prefix and short name.
///
/// `"a/b/c"` becomes `("job/a/job/b/", "c")`; a top-level name has an empty
/// prefix. The prefix is ready to be placed directly in front of
/// `job/{name}`.
pub fn parse_fullname(fullname: &str) -> (String, String) {
    match fullname.rsplit_once('/') {
        Some((folders, name)) => {
            let folder = format!("job/{}/", folders.replace('/', "/job/"));
            (folder, name.to_string())
        }
        None => (String::new(), fullname.to_string()),
    }
}

/// Names under which Jenkins exposes the built-in controller node
const CONTROLLER_NAMES: [&str; 2] = ["master", "Built-In Node"];

/// The `computer/{name}` segment for a node. The controller's display name
/// differs from its URL name, which is always `(master)`.
pub fn node_segment(name: &str) -> &str {
    if CONTROLLER_NAMES.contains(&name) {
        "(master)"
    } else {
        name
    }
}

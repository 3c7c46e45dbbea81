//! Symbolic action-name constants.

use std::collections::BTreeMap;

/// Build a mapping where every name is both key and value.
///
/// Duplicates collapse into one entry.
pub fn key_mirror<I, S>(names: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref().to_string();
            (name.clone(), name)
        })
        .collect()
}

/// Declare `&'static str` constants whose value is their own name.
///
/// ```
/// flux_events::action_names!(ADD_TODO, REMOVE_TODO);
/// assert_eq!(ADD_TODO, "ADD_TODO");
/// ```
#[macro_export]
macro_rules! action_names {
    ($($name:ident),* $(,)?) => {
        $(
            pub const $name: &str = stringify!($name);
        )*
    };
}

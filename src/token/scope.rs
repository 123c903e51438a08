use crate::types::ResourceActions;

/// Parses raw `scope` query values into requested access entries.
///
/// `type:name:actions` maps directly. `type:a:b:actions` joins the two middle
/// segments back into the name `a:b`. Any other shape is dropped silently.
/// Order is preserved and duplicates are kept.
pub fn parse_scopes<'a, I>(raw: I) -> Vec<ResourceActions>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().filter_map(parse_scope).collect()
}

fn parse_scope(scope: &str) -> Option<ResourceActions> {
    let parts: Vec<&str> = scope.split(':').collect();

    let (resource_type, name, actions) = match parts.as_slice() {
        [resource_type, name, actions] => (*resource_type, (*name).to_string(), *actions),
        [resource_type, first, second, actions] => {
            (*resource_type, format!("{first}:{second}"), *actions)
        }
        _ => {
            tracing::debug!(scope, "discarding malformed scope");
            return None;
        }
    };

    let actions = actions.split(',').map(str::to_string).collect();
    Some(ResourceActions::new(resource_type, name, actions))
}

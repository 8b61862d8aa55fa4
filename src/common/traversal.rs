use serde_json::Value;

/// Keys whose value is a map of name → child node.
const CHILD_MAPS: [&str; 3] = ["properties", "patternProperties", "definitions"];
/// Keys whose value is a list of child nodes.
const CHILD_LISTS: [&str; 4] = ["fields", "oneOf", "allOf", "anyOf"];
/// Keys holding a child node, or a list mixing nodes and type tokens.
const CHILD_SLOTS: [&str; 3] = ["type", "items", "values"];

/// Bottom-up transform over a schema tree.
///
/// Children are rebuilt first, then `transform` sees the node with its
/// children already mapped. Works on both dialects: generic nodes nest
/// through `properties`/`items`, Avro nodes through `fields`/`type`/`items`.
/// Non-object values are returned unchanged.
pub fn map_schema_tree<F>(node: Value, transform: &F) -> Value
where
    F: Fn(Value) -> Value,
{
    let Value::Object(mut obj) = node else {
        return node;
    };

    for key in CHILD_MAPS {
        if let Some(Value::Object(children)) = obj.get_mut(key) {
            let taken = std::mem::take(children);
            *children = taken
                .into_iter()
                .map(|(name, child)| (name, map_schema_tree(child, transform)))
                .collect();
        }
    }

    for key in CHILD_LISTS {
        if let Some(Value::Array(children)) = obj.get_mut(key) {
            let taken = std::mem::take(children);
            *children = taken
                .into_iter()
                .map(|child| map_schema_tree(child, transform))
                .collect();
        }
    }

    for key in CHILD_SLOTS {
        match obj.get_mut(key) {
            Some(slot @ Value::Object(_)) => {
                let taken = slot.take();
                *slot = map_schema_tree(taken, transform);
            }
            Some(Value::Array(members)) => {
                let taken = std::mem::take(members);
                *members = taken
                    .into_iter()
                    .map(|member| {
                        if member.is_object() {
                            map_schema_tree(member, transform)
                        } else {
                            member
                        }
                    })
                    .collect();
            }
            _ => {}
        }
    }

    transform(Value::Object(obj))
}

/// Name of the definition a `$ref` points at.
///
/// Accepts `#/definitions/Name`, `#model/definitions/Name` and
/// `file.json#/definitions/Name`; anything that does not end in
/// `definitions/<name>` is rejected.
pub fn ref_target(reference: &str) -> Option<&str> {
    let fragment = reference.rsplit_once('#').map_or(reference, |(_, f)| f);
    let mut segments = fragment.rsplit('/');
    let name = segments.next().filter(|name| !name.is_empty())?;
    match segments.next() {
        Some("definitions") => Some(name),
        _ => None,
    }
}

/// Replace the definition name at the end of a `$ref`.
pub fn retarget_ref(reference: &str, name: &str) -> String {
    match reference.rsplit_once('/') {
        Some((prefix, _)) => format!("{prefix}/{name}"),
        None => name.to_string(),
    }
}

//! Template rendering: substitute `{{ name }}` placeholders with source
//! values. The output is the desired-state document that the flattener and
//! diff engine consume; nothing here knows about formats or stores.

use std::collections::BTreeMap;

use crate::error::ConfsyncError;

/// Render a template against a merged source mapping.
///
/// With `validate` on, a placeholder naming an unknown value is a fatal
/// error. With it off (push `--no-validation`, used when re-importing a
/// backup) unknown placeholders render as empty strings.
pub fn build(
    template: &[u8],
    values: &BTreeMap<String, String>,
    validate: bool,
) -> Result<Vec<u8>, ConfsyncError> {
    let text = String::from_utf8_lossy(template);
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_ref();
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(ConfsyncError::UnterminatedPlaceholder {
                offset: offset + start,
            });
        };
        let name = after[..end].trim();
        match values.get(name) {
            Some(value) => out.push_str(value),
            None if validate => {
                return Err(ConfsyncError::MissingPlaceholder {
                    name: name.to_string(),
                });
            }
            None => {}
        }
        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);

    Ok(out.into_bytes())
}

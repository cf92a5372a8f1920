//! Option schema derived from variation titles.
//!
//! Title segments map positionally onto option names: the first segment is
//! the `Color`, the second the `Size`, the third the `Material`. Any further
//! position is named `Option{N}` (1-based).

use crate::shopify::CreatedProduct;
use crate::shopify::admin::queries::{
    OptionCreateInput, OptionValueCreateInput, VariantOptionValueInput,
};

const POSITIONAL_NAMES: [&str; 3] = ["Color", "Size", "Material"];

/// One product option with its distinct values in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOption {
    pub name: String,
    pub values: Vec<String>,
}

/// Name of the option at a zero-based segment position.
#[must_use]
pub fn option_name(position: usize) -> String {
    POSITIONAL_NAMES
        .get(position)
        .map_or_else(|| format!("Option{}", position + 1), |name| (*name).to_string())
}

/// Collect the option schema from every variation's title segments.
///
/// Options come back in position order. Values are trimmed, deduplicated
/// and keep the order in which they first appear; empty values are ignored.
#[must_use]
pub fn extract_options<'a, I>(titles: I) -> Vec<ExtractedOption>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut options: Vec<ExtractedOption> = Vec::new();

    for segments in titles {
        for (position, raw) in segments.iter().enumerate() {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }

            while options.len() <= position {
                options.push(ExtractedOption {
                    name: option_name(options.len()),
                    values: Vec::new(),
                });
            }

            if let Some(option) = options.get_mut(position)
                && !option.values.iter().any(|v| v == value)
            {
                option.values.push(value.to_string());
            }
        }
    }

    // A position can exist with no values when every title left it blank.
    options.retain(|option| !option.values.is_empty());
    options
}

/// Convert the extracted schema into `productCreate` option inputs.
#[must_use]
pub fn to_option_inputs(options: &[ExtractedOption]) -> Vec<OptionCreateInput> {
    options
        .iter()
        .map(|option| OptionCreateInput {
            name: option.name.clone(),
            values: option
                .values
                .iter()
                .map(|value| OptionValueCreateInput {
                    name: value.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Resolve a variation's segments to the option ids of a created product.
///
/// Each segment is looked up under its positional option name; segments
/// whose option or value Shopify did not return are left out.
#[must_use]
pub fn resolve_option_values(
    product: &CreatedProduct,
    segments: &[String],
) -> Vec<VariantOptionValueInput> {
    segments
        .iter()
        .enumerate()
        .filter_map(|(position, raw)| {
            let value = raw.trim();
            let option = product.option(&option_name(position))?;
            option
                .values
                .iter()
                .any(|known| known == value)
                .then(|| VariantOptionValueInput {
                    option_id: option.id.clone(),
                    name: value.to_string(),
                })
        })
        .collect()
}

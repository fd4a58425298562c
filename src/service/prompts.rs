//! Prompt templates for the classification capability
//!
//! Only the capability adapter reads these; agents never see prompt text.

use crate::model::{SpecialistProfile, Taxonomy};

/// System prompt for the per-area deep analysis
pub const SPECIALIST_SYSTEM_PROMPT: &str = r#"You are a senior attorney who practices exclusively in one area of law.

Your role is to decide whether a prospective client's narrative presents a legal issue
within your practice area and, if so, to classify and explain it.

You must:
- Judge relevance strictly from the facts in the narrative
- Pick exactly one subcategory from the list you are given
- Connect specific facts to specific legal rules in your reasoning
- Report is_relevant = false when the matter belongs to a different area

Do not:
- Claim matters that belong to a commonly confused area
- Invent facts that are not in the narrative
- Choose a subcategory that is not in the list

Your output must be structured JSON only and conform to the requested schema."#;

/// System prompt for the focused subcategory re-ask
pub const SUBCATEGORY_SYSTEM_PROMPT: &str = r#"You are a legal intake assistant.

Choose the single subcategory that best fits the narrative. Copy the name exactly as it
appears in the list. Your output must be structured JSON only."#;

/// System prompt for the lower-bar connection check
pub const CONNECTION_SYSTEM_PROMPT: &str = r#"You are an attorney reviewing a narrative that may touch your practice area.

Decide whether the narrative has any legitimate connection to your area of law, even if
it is not the primary issue. Only report a connection that a reasonable attorney would
act on. Pick exactly one subcategory from the list you are given.

Your output must be structured JSON only and conform to the requested schema."#;

/// System prompt for the taxonomy-wide fallback classification
pub const GENERAL_SYSTEM_PROMPT: &str = r#"You are a legal intake specialist who routes prospective clients to the right practice area.

Pick the single best category and subcategory for the narrative from the taxonomy you are
given. Every narrative must be assigned; when in doubt choose the closest fit and say so
in your reasoning.

Your output must be structured JSON only and conform to the requested schema."#;

fn subcategory_list(profile: &SpecialistProfile) -> String {
    profile
        .subcategories
        .iter()
        .map(|s| {
            if s.description.is_empty() {
                format!("- {}", s.name)
            } else {
                format!("- {}: {}", s.name, s.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the deep analysis prompt for one practice area
pub fn build_specialist_prompt(narrative: &str, profile: &SpecialistProfile) -> String {
    format!(
        r#"## Practice area
{area}

## Definition
{definition}

## Key legal concepts
{concepts}

## Subcategories (choose exactly one)
{subcategories}

## Worked examples of matters in this area
{examples}

## Commonly confused areas
{related}

## Narrative
{narrative}

Report legal_area as "{area}". Provide urgency and complexity between 0.0 and 1.0."#,
        area = profile.name,
        definition = profile.definition.trim(),
        concepts = bullet_list(&profile.concepts),
        subcategories = subcategory_list(profile),
        examples = bullet_list(&profile.examples),
        related = bullet_list(&profile.related),
        narrative = narrative,
    )
}

/// Build the focused subcategory prompt
pub fn build_subcategory_prompt(narrative: &str, profile: &SpecialistProfile) -> String {
    format!(
        "## Practice area\n{}\n\n## Valid subcategories\n{}\n\n## Narrative\n{}",
        profile.name,
        subcategory_list(profile),
        narrative
    )
}

/// Build the connection check prompt for one practice area
pub fn build_connection_prompt(narrative: &str, profile: &SpecialistProfile) -> String {
    format!(
        "## Practice area\n{}\n\n## Definition\n{}\n\n## Subcategories\n{}\n\n## Narrative\n{}",
        profile.name,
        profile.definition.trim(),
        subcategory_list(profile),
        narrative
    )
}

/// Build the taxonomy-wide classification prompt
pub fn build_general_prompt(narrative: &str, taxonomy: &Taxonomy) -> String {
    let taxonomy_details = taxonomy
        .categories()
        .map(|category| {
            let definition = taxonomy
                .profile(category)
                .map(|p| p.definition.trim())
                .unwrap_or_default();
            let subcategories = taxonomy
                .subcategories(category)
                .unwrap_or_default()
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let mut section = format!(
                "### {}\n{}\nSubcategories: {}",
                category, definition, subcategories
            );
            let related = taxonomy.related_categories(category);
            if !related.is_empty() {
                section.push_str(&format!("\nCommonly confused with: {}", related.join(", ")));
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "## Taxonomy\n{}\n\n## Narrative\n{}",
        taxonomy_details, narrative
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialist_prompt_includes_profile_context() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let profile = taxonomy.profile("Landlord/Tenant Law").unwrap();
        let prompt = build_specialist_prompt("My landlord will not fix the mold", profile);

        assert!(prompt.contains("- Evictions: "));
        assert!(prompt.contains("warranty of habitability"));
        assert!(prompt.contains("- Real Estate Law"));
        assert!(prompt.contains("My landlord will not fix the mold"));
        assert!(prompt.contains(r#"Report legal_area as "Landlord/Tenant Law""#));
    }

    #[test]
    fn test_general_prompt_lists_every_category() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let prompt = build_general_prompt("narrative", &taxonomy);
        for category in taxonomy.categories() {
            assert!(prompt.contains(&format!("### {}", category)));
        }
        assert!(prompt.contains("Commonly confused with: Real Estate Law, Business/Corporate Law"));
    }
}

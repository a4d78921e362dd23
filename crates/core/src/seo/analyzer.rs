//! Deterministic product SEO rules.

use super::text::{is_readable_slug, slugify, strip_html, truncate_words, word_count};
use super::{
    IssueType, OptimizationField, ProductSnapshot, SeoAnalysisResult, SeoIssue, SeoOptimization,
    Severity,
};

/// Titles shorter than this are flagged.
pub const TITLE_MIN: usize = 20;
/// Titles longer than this get truncated in search results.
pub const TITLE_MAX: usize = 70;
/// Upper bound for a suggested meta title.
pub const META_TITLE_MAX: usize = 60;
/// Meta descriptions shorter than this are flagged.
pub const META_DESCRIPTION_MIN: usize = 50;
/// Meta descriptions longer than this are flagged.
pub const META_DESCRIPTION_MAX: usize = 160;
/// Length suggestions aim for.
pub const META_DESCRIPTION_TARGET: usize = 155;
/// Handles longer than this are flagged.
pub const HANDLE_MAX: usize = 60;
/// Body copy below this many words is considered thin.
pub const BODY_MIN_WORDS: usize = 150;

const GENERIC_DESCRIPTION_TAIL: &str =
    "Discover details, sizing and availability, with fast shipping and easy returns.";

/// Run every rule against `product`.
///
/// The result is a fresh snapshot; callers replace any stored analysis for the
/// same product with it.
#[must_use]
pub fn analyze_product(product: &ProductSnapshot) -> SeoAnalysisResult {
    let mut findings = Findings::default();

    check_title(product, &mut findings);
    check_meta_title(product, &mut findings);
    check_meta_description(product, &mut findings);
    check_images(product, &mut findings);
    check_handle(product, &mut findings);
    check_content(product, &mut findings);

    let penalty: u32 = findings
        .issues
        .iter()
        .map(|i| u32::from(i.severity.weight()))
        .sum();
    let score = u8::try_from(100_u32.saturating_sub(penalty)).unwrap_or(0);

    SeoAnalysisResult {
        product_id: product.id,
        title: product.title.clone(),
        handle: product.handle.clone(),
        issues: findings.issues,
        score,
        optimizations: findings.optimizations,
    }
}

#[derive(Default)]
struct Findings {
    issues: Vec<SeoIssue>,
    optimizations: Vec<SeoOptimization>,
}

impl Findings {
    fn issue(
        &mut self,
        issue_type: IssueType,
        severity: Severity,
        message: impl Into<String>,
        details: Option<String>,
    ) {
        self.issues.push(SeoIssue {
            issue_type,
            severity,
            message: message.into(),
            details,
        });
    }

    fn optimize(
        &mut self,
        optimization_type: IssueType,
        field: OptimizationField,
        original: &str,
        suggestion: String,
    ) {
        if suggestion.is_empty() || suggestion == original {
            return;
        }
        self.optimizations.push(SeoOptimization {
            optimization_type,
            field,
            original: original.to_string(),
            suggestion,
            applied: false,
        });
    }
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

fn check_title(product: &ProductSnapshot, f: &mut Findings) {
    let title = product.title.trim();
    let len = chars(title);

    if title.is_empty() {
        f.issue(IssueType::Title, Severity::High, "Product title is missing", None);
        return;
    }

    if len < TITLE_MIN {
        f.issue(
            IssueType::Title,
            Severity::Medium,
            "Product title is too short",
            Some(format!("{len} characters, aim for at least {TITLE_MIN}")),
        );

        let qualifier = [product.product_type.trim(), product.vendor.trim()]
            .into_iter()
            .find(|q| !q.is_empty() && !title.to_lowercase().contains(&q.to_lowercase()));
        if let Some(qualifier) = qualifier {
            let candidate = format!("{title} - {qualifier}");
            if chars(&candidate) <= TITLE_MAX {
                f.optimize(IssueType::Title, OptimizationField::Title, &product.title, candidate);
            }
        }
    } else if len > TITLE_MAX {
        f.issue(
            IssueType::Title,
            Severity::Medium,
            "Product title is too long and will be truncated in search results",
            Some(format!("{len} characters, keep it under {TITLE_MAX}")),
        );
        f.optimize(
            IssueType::Title,
            OptimizationField::Title,
            &product.title,
            truncate_words(title, TITLE_MAX),
        );
    }
}

fn check_meta_title(product: &ProductSnapshot, f: &mut Findings) {
    let meta_title = product.meta_title.as_deref().map(str::trim).unwrap_or_default();
    if !meta_title.is_empty() {
        return;
    }

    f.issue(
        IssueType::Title,
        Severity::Medium,
        "Meta title is not set; search engines fall back to the product title",
        None,
    );
    f.optimize(
        IssueType::Title,
        OptimizationField::MetaTitle,
        "",
        truncate_words(&product.title, META_TITLE_MAX),
    );
}

fn check_meta_description(product: &ProductSnapshot, f: &mut Findings) {
    let current = product
        .meta_description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    let len = chars(current);

    if current.is_empty() {
        f.issue(
            IssueType::Description,
            Severity::High,
            "Meta description is missing",
            None,
        );
    } else if len < META_DESCRIPTION_MIN {
        f.issue(
            IssueType::Description,
            Severity::Medium,
            "Meta description is too short",
            Some(format!("{len} characters, aim for {META_DESCRIPTION_MIN}-{META_DESCRIPTION_MAX}")),
        );
    } else if len > META_DESCRIPTION_MAX {
        f.issue(
            IssueType::Description,
            Severity::Medium,
            "Meta description is too long and will be truncated",
            Some(format!("{len} characters, keep it under {META_DESCRIPTION_MAX}")),
        );
        f.optimize(
            IssueType::Description,
            OptimizationField::MetaDescription,
            current,
            truncate_words(current, META_DESCRIPTION_TARGET),
        );
        return;
    } else {
        return;
    }

    f.optimize(
        IssueType::Description,
        OptimizationField::MetaDescription,
        current,
        suggested_description(product),
    );
}

/// Build a meta description from the body copy, falling back to a template.
fn suggested_description(product: &ProductSnapshot) -> String {
    let excerpt = truncate_words(&strip_html(&product.body_html), META_DESCRIPTION_TARGET);
    if chars(&excerpt) >= META_DESCRIPTION_MIN {
        return excerpt;
    }

    let title = product.title.trim();
    let mut sentence = String::from("Shop ");
    sentence.push_str(if title.is_empty() { "this product" } else { title });
    let vendor = product.vendor.trim();
    if !vendor.is_empty() {
        sentence.push_str(" from ");
        sentence.push_str(vendor);
    }
    sentence.push_str(". ");
    sentence.push_str(if excerpt.is_empty() {
        GENERIC_DESCRIPTION_TAIL
    } else {
        &excerpt
    });

    truncate_words(&sentence, META_DESCRIPTION_TARGET)
}

fn check_images(product: &ProductSnapshot, f: &mut Findings) {
    if product.images.is_empty() {
        f.issue(
            IssueType::Image,
            Severity::High,
            "Product has no images",
            None,
        );
        return;
    }

    let title = product.title.trim();
    let many = product.images.len() > 1;

    for image in &product.images {
        let alt = image.alt.as_deref().map(str::trim).unwrap_or_default();
        if !alt.is_empty() {
            continue;
        }

        f.issue(
            IssueType::Image,
            Severity::Medium,
            "Image is missing alt text",
            Some(format!("image {} (position {})", image.id, image.position)),
        );

        let suggestion = match (title.is_empty(), many) {
            (true, _) => format!("Product image {}", image.position),
            (false, true) => format!("{title} - image {}", image.position),
            (false, false) => title.to_string(),
        };
        f.optimize(
            IssueType::Image,
            OptimizationField::ImageAlt { image_id: image.id },
            image.alt.as_deref().unwrap_or_default(),
            suggestion,
        );
    }
}

fn check_handle(product: &ProductSnapshot, f: &mut Findings) {
    let handle = product.handle.as_str();
    let readable = is_readable_slug(handle);
    let too_long = handle.len() > HANDLE_MAX;

    if readable && !too_long {
        return;
    }

    let message = if too_long {
        "URL handle is too long"
    } else {
        "URL handle is not a readable slug"
    };
    f.issue(
        IssueType::Url,
        Severity::Low,
        message,
        Some(format!("current handle: {handle}")),
    );
    f.optimize(
        IssueType::Url,
        OptimizationField::Handle,
        handle,
        slugify(&product.title, HANDLE_MAX),
    );
}

fn check_content(product: &ProductSnapshot, f: &mut Findings) {
    let words = word_count(&product.body_html);

    if words == 0 {
        f.issue(
            IssueType::Content,
            Severity::High,
            "Product description is empty",
            None,
        );
    } else if words < BODY_MIN_WORDS {
        f.issue(
            IssueType::Content,
            Severity::Medium,
            "Product description is thin",
            Some(format!("{words} words, aim for at least {BODY_MIN_WORDS}")),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seo::ImageSnapshot;

    fn long_body() -> String {
        format!("<p>{}</p>", "Organic cotton knit for everyday wear. ".repeat(40))
    }

    fn healthy_product() -> ProductSnapshot {
        ProductSnapshot {
            id: 101,
            title: "Organic Cotton Crew Neck T-Shirt".to_string(),
            handle: "organic-cotton-crew-neck-t-shirt".to_string(),
            body_html: long_body(),
            product_type: "T-Shirts".to_string(),
            vendor: "Acme".to_string(),
            meta_title: Some("Organic Cotton Crew Neck T-Shirt | Acme".to_string()),
            meta_description: Some(
                "A breathable organic cotton crew neck tee, cut for an easy fit and made to last through every wash."
                    .to_string(),
            ),
            images: vec![ImageSnapshot {
                id: 1,
                position: 1,
                alt: Some("Front of the tee".to_string()),
            }],
        }
    }

    #[test]
    fn test_healthy_product_scores_full_marks() {
        let result = analyze_product(&healthy_product());
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert!(result.optimizations.is_empty());
        assert_eq!(result.score, 100);
        assert_eq!(result.product_id, 101);
    }

    #[test]
    fn test_empty_meta_description_is_high_with_suggestion() {
        let product = ProductSnapshot {
            meta_description: Some(String::new()),
            ..healthy_product()
        };
        let result = analyze_product(&product);

        let issue = result
            .issues
            .iter()
            .find(|i| i.issue_type == IssueType::Description)
            .unwrap();
        assert_eq!(issue.severity, Severity::High);

        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::MetaDescription)
            .unwrap();
        assert!(!opt.suggestion.is_empty());
        assert!(opt.suggestion.chars().count() <= META_DESCRIPTION_TARGET);
        assert!(!opt.applied);
        assert_eq!(result.score, 80);
    }

    #[test]
    fn test_missing_description_without_body_uses_template() {
        let product = ProductSnapshot {
            meta_description: None,
            body_html: String::new(),
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::MetaDescription)
            .unwrap();
        assert!(opt.suggestion.starts_with("Shop Organic Cotton Crew Neck T-Shirt from Acme."));
        assert!(result
            .issues
            .iter()
            .any(|i| i.issue_type == IssueType::Content && i.severity == Severity::High));
    }

    #[test]
    fn test_long_meta_description_is_truncated() {
        let product = ProductSnapshot {
            meta_description: Some("word ".repeat(50)),
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::MetaDescription)
            .unwrap();
        assert!(opt.suggestion.chars().count() <= META_DESCRIPTION_TARGET);
    }

    #[test]
    fn test_short_title_gets_qualified() {
        let product = ProductSnapshot {
            title: "Crew Tee".to_string(),
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::Title)
            .unwrap();
        assert_eq!(opt.suggestion, "Crew Tee - T-Shirts");
        assert_eq!(opt.original, "Crew Tee");
    }

    #[test]
    fn test_long_title_is_truncated() {
        let product = ProductSnapshot {
            title: "Organic Cotton Crew Neck T-Shirt with Reinforced Seams and a Relaxed Everyday Fit".to_string(),
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::Title)
            .unwrap();
        assert!(opt.suggestion.chars().count() <= TITLE_MAX);
    }

    #[test]
    fn test_missing_alt_text_per_image() {
        let product = ProductSnapshot {
            images: vec![
                ImageSnapshot { id: 10, position: 1, alt: None },
                ImageSnapshot { id: 11, position: 2, alt: Some("  ".to_string()) },
                ImageSnapshot { id: 12, position: 3, alt: Some("Back".to_string()) },
            ],
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let alts: Vec<_> = result
            .optimizations
            .iter()
            .filter(|o| matches!(o.field, OptimizationField::ImageAlt { .. }))
            .collect();
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].field, OptimizationField::ImageAlt { image_id: 10 });
        assert_eq!(alts[0].suggestion, "Organic Cotton Crew Neck T-Shirt - image 1");
        assert_eq!(alts[0].original, "");
        assert_eq!(alts[1].original, "  ");
    }

    #[test]
    fn test_no_images_is_issue_only() {
        let product = ProductSnapshot {
            images: vec![],
            ..healthy_product()
        };
        let result = analyze_product(&product);
        assert!(result
            .issues
            .iter()
            .any(|i| i.issue_type == IssueType::Image && i.severity == Severity::High));
        assert!(result.optimizations.is_empty());
    }

    #[test]
    fn test_unreadable_handle_gets_slug() {
        let product = ProductSnapshot {
            handle: "Organic_Cotton_Tee_2".to_string(),
            ..healthy_product()
        };
        let result = analyze_product(&product);
        let opt = result
            .optimizations
            .iter()
            .find(|o| o.field == OptimizationField::Handle)
            .unwrap();
        assert_eq!(opt.suggestion, "organic-cotton-crew-neck-t-shirt");
        assert_eq!(result.score, 95);
    }

    #[test]
    fn test_score_never_underflows() {
        let product = ProductSnapshot {
            id: 5,
            handle: "Bad Handle".to_string(),
            images: (1..=10)
                .map(|n| ImageSnapshot { id: n, position: u32::try_from(n).unwrap(), alt: None })
                .collect(),
            ..ProductSnapshot::default()
        };
        let result = analyze_product(&product);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let product = ProductSnapshot {
            meta_description: None,
            ..healthy_product()
        };
        assert_eq!(analyze_product(&product), analyze_product(&product));
    }
}

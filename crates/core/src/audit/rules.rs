//! Audit rule table.

use std::collections::HashMap;

use uuid::Uuid;

use super::{
    AuditCategory, AuditFindings, AuditIssue, AuditMeta, AuditOptimization, SiteSnapshot,
};
use crate::seo::text::word_count;
use crate::seo::{BODY_MIN_WORDS, Severity};
use crate::types::MYSHOPIFY_SUFFIX;

const MIN_ARTICLES: u32 = 5;
const PAGE_MIN_WORDS: usize = 100;
const MAX_GALLERY_IMAGES: usize = 10;
const MOBILE_MAX_FIXED_WIDTH: u32 = 600;

/// Score a store snapshot.
#[must_use]
pub fn run_audit(site: &SiteSnapshot) -> AuditFindings {
    let mut audit = AuditBuilder::default();

    meta_rules(site, &mut audit);
    structure_rules(site, &mut audit);
    content_rules(site, &mut audit);
    performance_rules(site, &mut audit);
    mobile_rules(site, &mut audit);
    security_rules(site, &mut audit);

    let penalty: u32 = audit
        .issues
        .iter()
        .map(|i| u32::from(i.impact_score))
        .sum();

    AuditFindings {
        score: u8::try_from(100_u32.saturating_sub(penalty)).unwrap_or(0),
        issues: audit.issues,
        optimizations: audit.optimizations,
        meta: AuditMeta {
            pages_count: u32::try_from(site.pages.len()).unwrap_or(u32::MAX),
            blogs_count: site.blogs_count,
            articles_count: site.articles_count,
            products_count: site.products_count,
        },
    }
}

#[derive(Default)]
struct AuditBuilder {
    issues: Vec<AuditIssue>,
    optimizations: Vec<AuditOptimization>,
}

struct Finding<'a> {
    category: AuditCategory,
    severity: Severity,
    impact_score: u8,
    affected: usize,
    title: String,
    description: String,
    advice: &'a str,
    advice_detail: String,
}

impl AuditBuilder {
    fn push(&mut self, finding: Finding<'_>) {
        let issue_id = Uuid::new_v4();
        self.issues.push(AuditIssue {
            id: issue_id,
            category: finding.category,
            severity: finding.severity,
            title: finding.title,
            description: finding.description,
            impact_score: finding.impact_score,
            affected: u32::try_from(finding.affected).unwrap_or(u32::MAX),
        });
        self.optimizations.push(AuditOptimization {
            id: Uuid::new_v4(),
            category: finding.category,
            title: finding.advice.to_string(),
            description: finding.advice_detail,
            impact_score: finding.impact_score,
            issue_id: Some(issue_id),
        });
    }
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// High when at least half of `total` is affected.
const fn share_severity(affected: usize, total: usize) -> Severity {
    if affected * 2 >= total {
        Severity::High
    } else {
        Severity::Medium
    }
}

const fn share_impact(severity: Severity, high: u8, medium: u8) -> u8 {
    match severity {
        Severity::High => high,
        _ => medium,
    }
}

fn meta_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    let total = site.products.len();

    let missing_description = site
        .products
        .iter()
        .filter(|p| blank(p.meta_description.as_deref()))
        .count();
    if missing_description > 0 {
        let severity = share_severity(missing_description, total);
        audit.push(Finding {
            category: AuditCategory::Meta,
            severity,
            impact_score: share_impact(severity, 15, 8),
            affected: missing_description,
            title: "Products missing meta descriptions".to_string(),
            description: format!(
                "{missing_description} of {total} sampled products have no meta description."
            ),
            advice: "Write meta descriptions for product pages",
            advice_detail: "Analyze the affected products and apply the suggested descriptions, or run a bulk optimization.".to_string(),
        });
    }

    let missing_title = site
        .products
        .iter()
        .filter(|p| blank(p.meta_title.as_deref()))
        .count();
    if missing_title > 0 {
        audit.push(Finding {
            category: AuditCategory::Meta,
            severity: Severity::Medium,
            impact_score: 6,
            affected: missing_title,
            title: "Products missing meta titles".to_string(),
            description: format!("{missing_title} of {total} sampled products have no meta title."),
            advice: "Set keyword-focused meta titles",
            advice_detail: "Keep meta titles under 60 characters and lead with the product name.".to_string(),
        });
    }

    let pages_missing = site
        .pages
        .iter()
        .filter(|p| blank(p.meta_description.as_deref()))
        .count();
    if pages_missing > 0 {
        audit.push(Finding {
            category: AuditCategory::Meta,
            severity: Severity::Medium,
            impact_score: 5,
            affected: pages_missing,
            title: "Pages missing meta descriptions".to_string(),
            description: format!("{pages_missing} of {} pages have no meta description.", site.pages.len()),
            advice: "Describe every online-store page",
            advice_detail: "Summarize each page in 50-160 characters.".to_string(),
        });
    }

    let images_without_alt = site
        .products
        .iter()
        .flat_map(|p| &p.images)
        .filter(|i| blank(i.alt.as_deref()))
        .count();
    if images_without_alt > 0 {
        audit.push(Finding {
            category: AuditCategory::Meta,
            severity: Severity::Low,
            impact_score: 5,
            affected: images_without_alt,
            title: "Product images missing alt text".to_string(),
            description: format!("{images_without_alt} product images have no alt text."),
            advice: "Add descriptive alt text to product images",
            advice_detail: "Alt text helps image search and screen readers.".to_string(),
        });
    }
}

fn structure_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    if site.blogs_count == 0 {
        audit.push(Finding {
            category: AuditCategory::Structure,
            severity: Severity::Medium,
            impact_score: 8,
            affected: 1,
            title: "Store has no blog".to_string(),
            description: "A blog gives search engines fresh, linkable content.".to_string(),
            advice: "Create a blog",
            advice_detail: "Start a blog and link it from the main navigation.".to_string(),
        });
    }

    for (needle, label) in [("about", "About"), ("contact", "Contact")] {
        let present = site.pages.iter().any(|p| p.handle.contains(needle));
        if !present {
            audit.push(Finding {
                category: AuditCategory::Structure,
                severity: Severity::Low,
                impact_score: 4,
                affected: 1,
                title: format!("No {label} page"),
                description: format!("Shoppers and search engines expect an {label} page."),
                advice: "Publish the missing essential page",
                advice_detail: format!("Add an {label} page to the online store."),
            });
        }
    }

    let mut titles: HashMap<String, usize> = HashMap::new();
    for product in &site.products {
        let key = product.title.trim().to_lowercase();
        if !key.is_empty() {
            *titles.entry(key).or_insert(0) += 1;
        }
    }
    let duplicates: usize = titles.values().filter(|&&n| n > 1).sum();
    if duplicates > 0 {
        audit.push(Finding {
            category: AuditCategory::Structure,
            severity: Severity::Medium,
            impact_score: 6,
            affected: duplicates,
            title: "Duplicate product titles".to_string(),
            description: format!("{duplicates} products share a title with another product."),
            advice: "Make product titles unique",
            advice_detail: "Differentiate titles by color, size or material.".to_string(),
        });
    }

    if site.shop.primary_domain.ends_with(MYSHOPIFY_SUFFIX) {
        audit.push(Finding {
            category: AuditCategory::Structure,
            severity: Severity::Low,
            impact_score: 5,
            affected: 1,
            title: "Store uses the default myshopify.com domain".to_string(),
            description: "A custom domain builds brand authority in search results.".to_string(),
            advice: "Connect a custom domain",
            advice_detail: "Point a branded domain at the store and make it primary.".to_string(),
        });
    }
}

fn content_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    if site.articles_count < MIN_ARTICLES {
        audit.push(Finding {
            category: AuditCategory::Content,
            severity: Severity::Medium,
            impact_score: 8,
            affected: 1,
            title: "Few blog articles".to_string(),
            description: format!(
                "{} articles published; aim for at least {MIN_ARTICLES}.",
                site.articles_count
            ),
            advice: "Publish articles regularly",
            advice_detail: "Target questions your customers search for.".to_string(),
        });
    }

    let total = site.products.len();
    let thin = site
        .products
        .iter()
        .filter(|p| word_count(&p.body_html) < BODY_MIN_WORDS)
        .count();
    if thin > 0 {
        let severity = share_severity(thin, total);
        audit.push(Finding {
            category: AuditCategory::Content,
            severity,
            impact_score: share_impact(severity, 8, 4),
            affected: thin,
            title: "Thin product descriptions".to_string(),
            description: format!(
                "{thin} of {total} sampled products have fewer than {BODY_MIN_WORDS} words of description."
            ),
            advice: "Expand product descriptions",
            advice_detail: "Cover materials, use cases, sizing and care.".to_string(),
        });
    }

    let thin_pages = site
        .pages
        .iter()
        .filter(|p| word_count(&p.body_html) < PAGE_MIN_WORDS)
        .count();
    if thin_pages > 0 {
        audit.push(Finding {
            category: AuditCategory::Content,
            severity: Severity::Low,
            impact_score: 3,
            affected: thin_pages,
            title: "Thin pages".to_string(),
            description: format!("{thin_pages} pages have fewer than {PAGE_MIN_WORDS} words."),
            advice: "Flesh out short pages",
            advice_detail: "Add helpful, original copy to short pages.".to_string(),
        });
    }
}

fn performance_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    let heavy = site
        .products
        .iter()
        .filter(|p| p.images.len() > MAX_GALLERY_IMAGES)
        .count();
    if heavy > 0 {
        audit.push(Finding {
            category: AuditCategory::Performance,
            severity: Severity::Low,
            impact_score: 3,
            affected: heavy,
            title: "Large product galleries".to_string(),
            description: format!(
                "{heavy} products have more than {MAX_GALLERY_IMAGES} images, slowing page loads."
            ),
            advice: "Trim product galleries",
            advice_detail: "Keep the images that sell and compress the rest.".to_string(),
        });
    }
}

fn mobile_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    let bodies = site
        .pages
        .iter()
        .map(|p| p.body_html.as_str())
        .chain(site.products.iter().map(|p| p.body_html.as_str()));
    let fixed = bodies.filter(|b| has_fixed_width_content(b)).count();

    if fixed > 0 {
        audit.push(Finding {
            category: AuditCategory::Mobile,
            severity: Severity::Low,
            impact_score: 4,
            affected: fixed,
            title: "Fixed-width content".to_string(),
            description: format!(
                "{fixed} pages or products contain tables or elements wider than {MOBILE_MAX_FIXED_WIDTH}px."
            ),
            advice: "Make content responsive",
            advice_detail: "Replace fixed widths with percentages and avoid layout tables.".to_string(),
        });
    }
}

fn security_rules(site: &SiteSnapshot, audit: &mut AuditBuilder) {
    if site.shop.password_enabled {
        audit.push(Finding {
            category: AuditCategory::Security,
            severity: Severity::High,
            impact_score: 20,
            affected: 1,
            title: "Storefront is password protected".to_string(),
            description: "Search engines cannot crawl a password-protected storefront.".to_string(),
            advice: "Remove the storefront password",
            advice_detail: "Disable the password page once the store is ready to launch.".to_string(),
        });
    }

    let insecure = site
        .pages
        .iter()
        .map(|p| p.body_html.as_str())
        .chain(site.products.iter().map(|p| p.body_html.as_str()))
        .filter(|b| b.contains("src=\"http://") || b.contains("href=\"http://"))
        .count();
    if insecure > 0 {
        audit.push(Finding {
            category: AuditCategory::Security,
            severity: Severity::Low,
            impact_score: 3,
            affected: insecure,
            title: "Insecure links".to_string(),
            description: format!("{insecure} pages or products link to http:// resources."),
            advice: "Use https links",
            advice_detail: "Switch embedded images and links to https.".to_string(),
        });
    }
}

/// `<table>` or a `width` attribute/style at or above the mobile threshold.
fn has_fixed_width_content(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    if lower.contains("<table") {
        return true;
    }

    ["width=\"", "width:"].iter().any(|marker| {
        lower.match_indices(marker).any(|(idx, m)| {
            let digits: String = lower[idx + m.len()..]
                .trim_start()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits
                .parse::<u32>()
                .is_ok_and(|w| w >= MOBILE_MAX_FIXED_WIDTH)
        })
    })
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::audit::{PageSnapshot, ShopSnapshot};
    use crate::seo::{ImageSnapshot, ProductSnapshot};

    fn words(n: usize) -> String {
        format!("<p>{}</p>", "lorem ".repeat(n))
    }

    fn healthy_site() -> SiteSnapshot {
        let product = |id: i64, title: &str| ProductSnapshot {
            id,
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
            body_html: words(200),
            meta_title: Some(title.to_string()),
            meta_description: Some("A thoughtfully made product for everyday use.".to_string()),
            images: vec![ImageSnapshot {
                id,
                position: 1,
                alt: Some(title.to_string()),
            }],
            ..ProductSnapshot::default()
        };
        let page = |id: i64, handle: &str| PageSnapshot {
            id,
            title: handle.to_string(),
            handle: handle.to_string(),
            body_html: words(150),
            meta_description: Some("Everything you need to know.".to_string()),
        };

        SiteSnapshot {
            shop: ShopSnapshot {
                name: "Acme".to_string(),
                primary_domain: "acme.com".to_string(),
                password_enabled: false,
            },
            pages: vec![page(1, "about-us"), page(2, "contact")],
            blogs_count: 1,
            articles_count: 12,
            products_count: 2,
            products: vec![product(1, "Canvas Tote"), product(2, "Linen Apron")],
        }
    }

    #[test]
    fn test_healthy_site_scores_full_marks() {
        let findings = run_audit(&healthy_site());
        assert!(findings.issues.is_empty(), "{:?}", findings.issues);
        assert_eq!(findings.score, 100);
        assert_eq!(findings.meta.pages_count, 2);
        assert_eq!(findings.meta.articles_count, 12);
    }

    #[test]
    fn test_password_protected_store_is_security_issue() {
        let mut site = healthy_site();
        site.shop.password_enabled = true;
        let findings = run_audit(&site);

        let issue = findings
            .issues
            .iter()
            .find(|i| i.category == AuditCategory::Security)
            .expect("security issue");
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.impact_score, 20);
        assert_eq!(findings.score, 80);
    }

    #[test]
    fn test_every_issue_has_linked_optimization_with_unique_ids() {
        let mut site = healthy_site();
        site.blogs_count = 0;
        site.articles_count = 0;
        site.pages.clear();
        site.shop.primary_domain = "acme.myshopify.com".to_string();
        for p in &mut site.products {
            p.meta_description = None;
        }

        let findings = run_audit(&site);
        assert_eq!(findings.issues.len(), findings.optimizations.len());

        let mut ids: Vec<Uuid> = findings.issues.iter().map(|i| i.id).collect();
        ids.extend(findings.optimizations.iter().map(|o| o.id));
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);

        for opt in &findings.optimizations {
            assert!(findings.issues.iter().any(|i| Some(i.id) == opt.issue_id));
        }
    }

    #[test]
    fn test_missing_meta_descriptions_scale_with_share() {
        let mut site = healthy_site();
        if let Some(p) = site.products.first_mut() {
            p.meta_description = None;
        }
        let findings = run_audit(&site);
        let issue = findings
            .issues
            .iter()
            .find(|i| i.title == "Products missing meta descriptions")
            .expect("meta issue");
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.affected, 1);
    }

    #[test]
    fn test_duplicate_titles_counted() {
        let mut site = healthy_site();
        if let Some(p) = site.products.get_mut(1) {
            p.title = "canvas tote".to_string();
        }
        let findings = run_audit(&site);
        let issue = findings
            .issues
            .iter()
            .find(|i| i.title == "Duplicate product titles")
            .expect("duplicate issue");
        assert_eq!(issue.affected, 2);
    }

    #[test]
    fn test_fixed_width_detection() {
        assert!(has_fixed_width_content("<TABLE><tr></tr></TABLE>"));
        assert!(has_fixed_width_content("<img width=\"800\" src=\"a.png\">"));
        assert!(has_fixed_width_content("<div style=\"width: 960px\">"));
        assert!(!has_fixed_width_content("<div style=\"width: 100%\">"));
        assert!(!has_fixed_width_content("<img width=\"320\">"));
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let mut site = healthy_site();
        site.shop.password_enabled = true;
        site.shop.primary_domain = "acme.myshopify.com".to_string();
        site.blogs_count = 0;
        site.articles_count = 0;
        site.pages = vec![PageSnapshot {
            body_html: "<table width=\"900\"><a href=\"http://x\">x</a></table>".to_string(),
            ..PageSnapshot::default()
        }];
        for p in &mut site.products {
            p.meta_description = None;
            p.meta_title = None;
            p.body_html = String::new();
            p.title = "Same".to_string();
            p.images = (0..12)
                .map(|n| ImageSnapshot { id: n, position: 1, alt: None })
                .collect();
        }
        let findings = run_audit(&site);
        assert_eq!(findings.score, 0);
    }
}

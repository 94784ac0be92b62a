use url::Url;

use super::{dto::ToolForm, repo_types::ToolDraft};
use crate::error::FieldErrors;

pub const MIN_DESCRIPTION_CHARS: usize = 10;

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Empty strings from blank inputs count as absent.
fn blank_to_none(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Trimmed, non-empty, first occurrence wins.
pub fn normalize_badges(badges: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(badges.len());
    for badge in badges {
        let badge = badge.trim();
        if !badge.is_empty() && !out.iter().any(|b| b == badge) {
            out.push(badge.to_string());
        }
    }
    out
}

/// Check every field and collect all problems; nothing is written unless this passes.
pub fn validate_tool(form: ToolForm) -> Result<ToolDraft, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &str, msg: &str| {
        errors.entry(field.to_string()).or_insert_with(|| msg.to_string());
    };

    let name = form.name.trim().to_string();
    if name.is_empty() {
        fail("name", "Name is required");
    }

    let description = form.description.trim().to_string();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        fail("description", "Description must be at least 10 characters");
    }

    let category_id = form.category.trim().to_string();
    if category_id.is_empty() {
        fail("category", "Category is required");
    }
    let ecosystem_id = form.ecosystem.trim().to_string();
    if ecosystem_id.is_empty() {
        fail("ecosystem", "Ecosystem is required");
    }

    let website_url = form.website_url.trim().to_string();
    if !is_http_url(&website_url) {
        fail("website_url", "Must be a valid URL");
    }
    let logo_url = form.logo_url.trim().to_string();
    if !is_http_url(&logo_url) {
        fail("logo_url", "Must be a valid URL");
    }

    let github_link = blank_to_none(form.github_link);
    let github_stars = form.github_stars;
    if form.no_github_repo {
        if github_link.is_some() {
            fail("github_link", "Must be empty when the tool has no GitHub repo");
        }
        if github_stars.is_some() {
            fail("github_stars", "Must be empty when the tool has no GitHub repo");
        }
    } else {
        match github_link.as_deref() {
            None => fail("github_link", "GitHub link is required"),
            Some(link) if !is_http_url(link) => fail("github_link", "Must be a valid URL"),
            Some(_) => {}
        }
        match github_stars {
            None => fail("github_stars", "GitHub stars are required"),
            Some(stars) if stars < 0 => {
                fail("github_stars", "GitHub stars must be a non-negative integer")
            }
            Some(_) => {}
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ToolDraft {
        name,
        description,
        category_id,
        ecosystem_id,
        github_link,
        github_stars,
        website_url,
        logo_url,
        badges: normalize_badges(form.badges),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ToolForm {
        ToolForm {
            name: "ripgrep".into(),
            description: "Recursively search directories for a regex".into(),
            category: "cli".into(),
            ecosystem: "rust".into(),
            no_github_repo: false,
            github_link: Some("https://github.com/BurntSushi/ripgrep".into()),
            github_stars: Some(45_000),
            website_url: "https://github.com/BurntSushi/ripgrep".into(),
            logo_url: "https://example.org/rg.png".into(),
            badges: vec!["search".into(), "cli".into()],
        }
    }

    #[test]
    fn accepts_complete_form() {
        let draft = validate_tool(valid_form()).unwrap();
        assert_eq!(draft.name, "ripgrep");
        assert_eq!(draft.github_stars, Some(45_000));
        assert_eq!(draft.category_id, "cli");
    }

    #[test]
    fn no_github_repo_persists_nulls() {
        let form = ToolForm {
            no_github_repo: true,
            github_link: None,
            github_stars: None,
            ..valid_form()
        };
        let draft = validate_tool(form).unwrap();
        assert_eq!(draft.github_link, None);
        assert_eq!(draft.github_stars, None);
    }

    #[test]
    fn no_github_repo_rejects_link_or_stars() {
        let with_link = ToolForm {
            no_github_repo: true,
            github_stars: None,
            ..valid_form()
        };
        let errors = validate_tool(with_link).unwrap_err();
        assert!(errors.contains_key("github_link"));
        assert!(!errors.contains_key("github_stars"));

        let with_stars = ToolForm {
            no_github_repo: true,
            github_link: None,
            github_stars: Some(0),
            ..valid_form()
        };
        let errors = validate_tool(with_stars).unwrap_err();
        assert!(errors.contains_key("github_stars"));
    }

    #[test]
    fn blank_github_link_counts_as_absent() {
        let form = ToolForm {
            no_github_repo: true,
            github_link: Some("   ".into()),
            github_stars: None,
            ..valid_form()
        };
        assert!(validate_tool(form).is_ok());
    }

    #[test]
    fn github_fields_required_without_flag() {
        let form = ToolForm {
            github_link: None,
            github_stars: None,
            ..valid_form()
        };
        let errors = validate_tool(form).unwrap_err();
        assert!(errors.contains_key("github_link"));
        assert!(errors.contains_key("github_stars"));
    }

    #[test]
    fn negative_stars_rejected() {
        let form = ToolForm {
            github_stars: Some(-1),
            ..valid_form()
        };
        let errors = validate_tool(form).unwrap_err();
        assert_eq!(errors["github_stars"], "GitHub stars must be a non-negative integer");
    }

    #[test]
    fn collects_every_field_error() {
        let errors = validate_tool(ToolForm::default()).unwrap_err();
        for field in [
            "name",
            "description",
            "category",
            "ecosystem",
            "website_url",
            "logo_url",
            "github_link",
            "github_stars",
        ] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn url_fields_need_http_scheme() {
        let form = ToolForm {
            website_url: "ftp://example.org".into(),
            logo_url: "not a url".into(),
            ..valid_form()
        };
        let errors = validate_tool(form).unwrap_err();
        assert!(errors.contains_key("website_url"));
        assert!(errors.contains_key("logo_url"));
    }

    #[test]
    fn short_description_rejected() {
        let form = ToolForm {
            description: " too short ".into(),
            ..valid_form()
        };
        assert!(validate_tool(form).unwrap_err().contains_key("description"));
    }

    #[test]
    fn badges_are_normalized() {
        assert_eq!(
            normalize_badges(vec![" fast ".into(), "".into(), "fast".into(), "cli".into()]),
            vec!["fast".to_string(), "cli".to_string()]
        );
    }
}

use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    catalog::resolve_name,
    dto::{CatalogFilter, CatalogView, ToolDetails, ToolForm, UNCATEGORIZED},
    repo,
    repo_types::{DeletedTool, Tool, ToolDraft},
    validation::validate_tool,
};
use crate::{
    error::{AppError, FieldErrors},
    images::services::{delete_logo_best_effort, rehost_logo},
    likes,
    search::SearchDocument,
    state::AppState,
    taxonomy::{self, TaxonomyKind},
};

/// Full catalog with both taxonomies, filtered in memory.
pub async fn catalog(st: &AppState, filter: &CatalogFilter) -> Result<CatalogView, AppError> {
    let (tools, categories, ecosystems) = tokio::try_join!(
        repo::list_all(&st.db),
        taxonomy::repo::list(&st.db, TaxonomyKind::Category),
        taxonomy::repo::list(&st.db, TaxonomyKind::Ecosystem),
    )?;
    Ok(CatalogView {
        tools: filter.apply(tools),
        categories,
        ecosystems,
    })
}

async fn term_name(st: &AppState, kind: TaxonomyKind, id: Option<&str>) -> anyhow::Result<Option<String>> {
    match id {
        Some(id) => Ok(taxonomy::repo::find(&st.db, kind, id).await?.map(|t| t.name)),
        None => Ok(None),
    }
}

pub async fn tool_details(st: &AppState, id: Uuid, viewer: Option<Uuid>) -> Result<ToolDetails, AppError> {
    let tool = repo::find(&st.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;

    let (category, ecosystem) = tokio::try_join!(
        term_name(st, TaxonomyKind::Category, tool.category_id.as_deref()),
        term_name(st, TaxonomyKind::Ecosystem, tool.ecosystem_id.as_deref()),
    )?;
    let liked = match viewer {
        Some(user_id) => likes::repo::is_liked(&st.db, user_id, id).await?,
        None => false,
    };

    let category_name = resolve_name_opt(category);
    let ecosystem_name = resolve_name_opt(ecosystem);
    Ok(ToolDetails {
        tool,
        category_name,
        ecosystem_name,
        liked,
    })
}

fn resolve_name_opt(name: Option<String>) -> String {
    name.unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Both references must point at existing rows.
async fn check_references(st: &AppState, draft: &ToolDraft) -> Result<(), AppError> {
    let (category, ecosystem) = tokio::try_join!(
        taxonomy::repo::find(&st.db, TaxonomyKind::Category, &draft.category_id),
        taxonomy::repo::find(&st.db, TaxonomyKind::Ecosystem, &draft.ecosystem_id),
    )?;
    let mut errors = FieldErrors::new();
    if category.is_none() {
        errors.insert("category".into(), "Unknown category".into());
    }
    if ecosystem.is_none() {
        errors.insert("ecosystem".into(), "Unknown ecosystem".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub(crate) fn search_document(tool: &Tool, category_name: String) -> SearchDocument {
    SearchDocument {
        id: tool.id.to_string(),
        name: tool.name.clone(),
        category: category_name,
        badges: tool.badges.clone(),
        description: tool.description.clone(),
        logo_url: tool.logo_url.clone(),
        like_count: tool.like_count,
    }
}

/// Keep the search index in step with a written tool. Failures are logged only.
async fn index_best_effort(st: &AppState, tool: &Tool) {
    let category = match term_name(st, TaxonomyKind::Category, tool.category_id.as_deref()).await {
        Ok(name) => resolve_name_opt(name),
        Err(e) => {
            error!(error = %e, tool_id = %tool.id, "category lookup for index failed");
            return;
        }
    };
    if let Err(e) = st.search.upsert_tool(&search_document(tool, category)).await {
        error!(error = %e, tool_id = %tool.id, "search upsert failed");
    }
}

/// Re-upsert one tool's search document after a change made outside this module.
pub(crate) async fn refresh_index(st: &AppState, id: Uuid) {
    match repo::find(&st.db, id).await {
        Ok(Some(tool)) => index_best_effort(st, &tool).await,
        Ok(None) => {}
        Err(e) => error!(error = %e, tool_id = %id, "tool lookup for index failed"),
    }
}

pub async fn create_tool(st: &AppState, form: ToolForm) -> Result<Tool, AppError> {
    let mut draft = validate_tool(form).map_err(AppError::Validation)?;
    check_references(st, &draft).await?;

    draft.logo_url = rehost_logo(st, &draft.name, &draft.logo_url).await?;

    let tool = match repo::insert(&st.db, &draft).await {
        Ok(tool) => tool,
        Err(e) => {
            // Do not leave an orphaned upload behind.
            delete_logo_best_effort(st, &draft.logo_url).await;
            return Err(e.into());
        }
    };
    index_best_effort(st, &tool).await;
    info!(tool_id = %tool.id, name = %tool.name, "tool created");
    Ok(tool)
}

pub async fn update_tool(st: &AppState, id: Uuid, form: ToolForm) -> Result<Tool, AppError> {
    let mut draft = validate_tool(form).map_err(AppError::Validation)?;
    let existing = repo::find(&st.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;
    check_references(st, &draft).await?;

    let logo_changed = draft.logo_url != existing.logo_url;
    if logo_changed {
        draft.logo_url = rehost_logo(st, &draft.name, &draft.logo_url).await?;
    }

    let tool = match repo::update(&st.db, id, &draft).await {
        Ok(Some(tool)) => tool,
        failed => {
            // The fresh upload is not referenced by any row.
            if logo_changed {
                delete_logo_best_effort(st, &draft.logo_url).await;
            }
            return Err(match failed {
                Err(e) => e.into(),
                _ => AppError::NotFound("Tool not found".into()),
            });
        }
    };

    if logo_changed {
        delete_logo_best_effort(st, &existing.logo_url).await;
    }
    index_best_effort(st, &tool).await;
    info!(tool_id = %tool.id, logo_changed, "tool updated");
    Ok(tool)
}

/// Remove a tool, its logo, likes, comments and search entry.
/// The logo goes only once the rows are committed.
pub async fn delete_tool(st: &AppState, id: Uuid) -> Result<DeletedTool, AppError> {
    let deleted = repo::delete_with_relations(&st.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;

    delete_logo_best_effort(st, &deleted.logo_url).await;

    if let Err(e) = st.search.delete_tool(id).await {
        warn!(error = %e, tool_id = %id, "search delete failed");
    }
    info!(
        tool_id = %id,
        likes = deleted.likes,
        comments = deleted.comments,
        "tool deleted"
    );
    Ok(deleted)
}

/// Push every tool into the search index; returns how many were indexed.
pub async fn reindex_all(st: &AppState) -> Result<usize, AppError> {
    st.search
        .ensure_collection()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let tools = repo::list_all(&st.db).await?;
    let categories = taxonomy::repo::name_index(&st.db, TaxonomyKind::Category).await?;
    for tool in &tools {
        let doc = search_document(tool, resolve_name(&categories, tool.category_id.as_deref()));
        st.search
            .upsert_tool(&doc)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
    }
    info!(count = tools.len(), "search index rebuilt");
    Ok(tools.len())
}

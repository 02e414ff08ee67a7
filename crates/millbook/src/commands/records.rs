//! Ledger command handlers.
//!
//! `list` mounts a `ListController` over an in-memory address bar and
//! waits for the first settled page. Writes go through the CRUD facade
//! behind the same dialog flow a form would use.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use millbook_core::query::{DEFAULT_SORT_BY, encode};
use millbook_core::{
    ClientConfig, DialogHandle, GENERIC_FAILURE, Ledger, ListController, ListQuery,
    MemoryQueryStore, Resource, ResourceCrudFacade, Row, RowId, RowMode, RowSelection, Scope,
    SortOrder,
};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat, RecordArgs, RecordCommand, WriteArgs};
use crate::config::Config;
use crate::csv_import::CsvParser;
use crate::error::CliError;
use crate::notify::StderrNotifier;
use crate::output;

use super::util;

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ledger: Ledger,
    args: RecordArgs,
    client: &ClientConfig,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let scope = Scope::connect(client, Arc::new(StderrNotifier::new(global.quiet)))?;
    let resource = Resource::from(ledger);

    match args.command {
        RecordCommand::List(list) => list_page(ledger, scope, resource, &list, global, cfg).await,

        RecordCommand::Create(write) => {
            let dialog = DialogHandle::new();
            dialog.open_add();
            submit(ledger, scope, resource, &dialog, &write, global).await
        }

        RecordCommand::Update { id, write } => {
            let dialog = DialogHandle::new();
            dialog.open_for(RowMode::Edit, stub_row(&id));
            submit(ledger, scope, resource, &dialog, &write, global).await
        }

        RecordCommand::Delete { id } => {
            ensure_confirmed(
                &format!("Delete {} '{id}'?", ledger.label().to_lowercase()),
                "delete",
                global,
            )?;
            let dialog = DialogHandle::new();
            dialog.open_for(RowMode::Delete, stub_row(&id));
            ResourceCrudFacade::new(scope, resource)
                .confirm_delete(&dialog)
                .await?;
            Ok(())
        }

        RecordCommand::BulkDelete { ids } => {
            let mut selection: RowSelection = ids.into_iter().map(RowId::from).collect();
            ensure_confirmed(
                &format!("Delete {} {} records?", selection.len(), resource.path()),
                "bulk-delete",
                global,
            )?;
            let dialog = DialogHandle::new();
            dialog.open_bulk();
            ResourceCrudFacade::new(scope, resource)
                .confirm_bulk_delete(&dialog, &mut selection)
                .await?;
            Ok(())
        }

        RecordCommand::Import { file } => import(scope, resource, &file, global).await,
    }
}

// ── List ────────────────────────────────────────────────────────────

fn build_query(list: &ListArgs, cfg: &Config) -> Result<ListQuery, CliError> {
    let mut query = ListQuery::default()
        .with_page_size(list.page_size.unwrap_or(cfg.defaults.page_size))
        .with_search(list.search.as_deref());

    if list.sort_by.is_some() || list.sort_order.is_some() {
        query = query.with_sort(
            list.sort_by.as_deref().unwrap_or(DEFAULT_SORT_BY),
            list.sort_order.map_or_else(SortOrder::default, Into::into),
        );
    }
    for pair in &list.filter {
        let (field, value) = util::split_pair(pair, "filter")?;
        query = query.with_filter(field, Some(value));
    }
    if let Some(page) = list.page {
        query = query.with_page(page);
    }
    Ok(query)
}

async fn list_page(
    ledger: Ledger,
    scope: Scope,
    resource: Resource,
    list: &ListArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let query = build_query(list, cfg)?;
    let address_bar = Arc::new(MemoryQueryStore::new(encode(&query)));
    let controller = ListController::mount(scope, resource, address_bar);

    let mut stream = controller.subscribe();
    let state = stream
        .wait_for(|state| !state.is_loading)
        .await
        .ok_or_else(|| CliError::Internal("list closed before a page arrived".into()))?;
    controller.unmount();

    if state.is_error {
        return Err(state.last_error.clone().map_or_else(
            || CliError::ApiError {
                message: GENERIC_FAILURE.into(),
            },
            CliError::from,
        ));
    }

    let out = output::render_rows(
        global.format(),
        &state.data,
        ledger.summary_fields(),
        &state.pagination,
    )?;
    output::print_output(&out, global.quiet);
    if *global.format() == OutputFormat::Table && !global.quiet {
        eprintln!("{}", output::pagination_footer(&state.pagination));
    }
    Ok(())
}

// ── Writes ──────────────────────────────────────────────────────────

/// A row carrying only its id, enough to bind an edit or delete dialog.
fn stub_row(id: &str) -> Row {
    Row::from_value(json!({ "_id": id }))
}

async fn submit(
    ledger: Ledger,
    scope: Scope,
    resource: Resource,
    dialog: &DialogHandle,
    write: &WriteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let values = util::derive_fields(ledger, util::form_values(write)?)?;
    let stored = ResourceCrudFacade::new(scope, resource)
        .submit(dialog, &values)
        .await?;
    let out = output::render_row(global.format(), &stored)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn import(
    scope: Scope,
    resource: Resource,
    file: &Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let response = ResourceCrudFacade::new(scope, resource)
        .import(&CsvParser, file)
        .await?;
    // The success notice already went to stderr
    if *global.format() != OutputFormat::Table {
        let out = output::render_single(global.format(), &response, |_| String::new(), |_| {
            String::new()
        })?;
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

fn ensure_confirmed(prompt: &str, action: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if util::confirm(prompt, global.yes)? {
        Ok(())
    } else {
        Err(CliError::NotConfirmed {
            action: action.into(),
        })
    }
}

//! Admin collection commands. All of them run behind the login guard.

use super::{guarded, Context};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use school_api::{ListQuery, Page, Resource};
use serde_json::{json, Value};
use std::io::{self, Write};

/// Filters shared by every `list` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Status filter (e.g. active, pending)
    #[arg(long)]
    pub status: Option<String>,

    /// Page number
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Items per page
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Extra filter as KEY=VALUE (repeatable)
    #[arg(long = "filter", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,
}

impl ListArgs {
    pub fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if let Some(search) = &self.search {
            query = query.search(search);
        }
        if let Some(status) = &self.status {
            query = query.status(status);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(per_page) = self.per_page {
            query = query.per_page(per_page);
        }
        for (key, value) in &self.filters {
            query = query.param(key, value);
        }
        query
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Registration review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewAction {
    Approve,
    Reject,
}

fn columns(resource: Resource) -> &'static [(&'static str, usize)] {
    match resource {
        Resource::Users => &[("id", 6), ("username", 20), ("email", 30), ("role", 10)],
        Resource::Students => &[
            ("id", 6),
            ("student_id", 12),
            ("full_name", 28),
            ("grade_level", 10),
            ("status", 10),
        ],
        Resource::Teachers => &[
            ("id", 6),
            ("teacher_id", 12),
            ("full_name", 28),
            ("department", 18),
            ("email", 28),
        ],
        Resource::Materials => &[
            ("id", 6),
            ("title", 32),
            ("subject", 16),
            ("grade_level", 10),
            ("material_type", 12),
        ],
        Resource::Schedules => &[
            ("id", 6),
            ("title", 24),
            ("day_of_week", 10),
            ("start_time", 6),
            ("end_time", 6),
            ("room", 8),
        ],
    }
}

const REGISTRATION_COLUMNS: &[(&str, usize)] = &[
    ("id", 6),
    ("full_name", 28),
    ("email", 30),
    ("grade_applying", 10),
    ("status", 10),
];

/// `<collection> list`
pub async fn list(
    ctx: &Context,
    resource: Resource,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let query = args.to_query();
    let page = guarded(ctx, |_| async move { ctx.api.admin().list(resource, &query).await }).await?;
    print_page(&page, columns(resource), &resource.to_string(), format);
    Ok(())
}

/// `registrations list`
pub async fn list_registrations(ctx: &Context, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let query = args.to_query();
    let page = guarded(ctx, |_| async move { ctx.api.admin().registrations(&query).await }).await?;
    print_page(&page, REGISTRATION_COLUMNS, "registrations", format);
    Ok(())
}

/// `<collection> show <id>`
pub async fn show(ctx: &Context, resource: Resource, id: i64, format: OutputFormat) -> Result<()> {
    if resource == Resource::Users {
        bail!("Users cannot be fetched individually; use `users list`");
    }

    let response = guarded(ctx, |_| async move { ctx.api.admin().get(resource, id).await }).await?;
    let item = response.data_value();

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("{} #{}", resource, id));
            if let Value::Object(fields) = item {
                for (key, value) in fields {
                    output::print_row(key, &output::cell(Some(value)));
                }
            }
        }
        OutputFormat::Json => output::print_json(item),
    }
    Ok(())
}

/// `<collection> delete <id>`
pub async fn delete(
    ctx: &Context,
    resource: Resource,
    id: i64,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    if !yes && !confirm(&format!("Delete {} #{}?", resource, id)) {
        output::print_success("Cancelled", format);
        return Ok(());
    }

    let response = guarded(ctx, |_| async move { ctx.api.admin().delete(resource, id).await }).await?;
    output::print_success(response.message().unwrap_or("Deleted"), format);
    Ok(())
}

/// `registrations approve|reject <id>`
pub async fn registration_review(
    ctx: &Context,
    id: i64,
    action: ReviewAction,
    notes: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let body = notes.map(|notes| json!({ "admin_notes": notes }));
    let response = guarded(ctx, |_| async move {
        let admin = ctx.api.admin();
        match action {
            ReviewAction::Approve => admin.approve_registration(id, body).await,
            ReviewAction::Reject => admin.reject_registration(id, body).await,
        }
    })
    .await?;

    let fallback = match action {
        ReviewAction::Approve => "Registration approved",
        ReviewAction::Reject => "Registration rejected",
    };
    output::print_success(response.message().unwrap_or(fallback), format);
    Ok(())
}

/// `dashboard`
pub async fn dashboard(ctx: &Context, format: OutputFormat) -> Result<()> {
    let stats = guarded(ctx, |_| async move { ctx.api.admin().dashboard_stats().await }).await?;

    match format {
        OutputFormat::Text => {
            output::print_heading("Dashboard");
            output::print_row("Students", &stats.total_students.to_string());
            output::print_row("Teachers", &stats.total_teachers.to_string());
            output::print_row("Pending registrations", &stats.pending_registrations.to_string());
            output::print_row("Materials", &stats.total_materials.to_string());
            output::print_row("Schedules", &stats.total_schedules.to_string());

            if !stats.recent_registrations.is_empty() {
                output::print_heading("Recent registrations");
                let rows: Vec<Value> = stats
                    .recent_registrations
                    .iter()
                    .cloned()
                    .map(Value::Object)
                    .collect();
                output::print_table(REGISTRATION_COLUMNS, &rows);
            }
        }
        OutputFormat::Json => output::print_json(&stats),
    }
    Ok(())
}

fn print_page(page: &Page, columns: &[(&str, usize)], label: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if page.items.is_empty() {
                println!("No {} found", label);
                return;
            }
            output::print_table(columns, &page.items);
            println!();
            println!(
                "Page {} of {} ({} total)",
                page.current_page,
                page.pages.max(1),
                page.total
            );
        }
        OutputFormat::Json => output::print_json(&json!({
            "items": page.items,
            "total": page.total,
            "pages": page.pages,
            "current_page": page.current_page,
        })),
    }
}

/// Ask user for confirmation.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

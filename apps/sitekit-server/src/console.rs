//! Human-readable console output for `check` and `routes`.

use colored::Colorize;
use modkit::{ResolutionReport, RouteTable};

#[must_use]
pub fn render_report(report: &ResolutionReport) -> String {
    let mut lines = vec![
        "Module dependency analysis".bold().to_string(),
        format!("{} {}", "Requested:".cyan(), report.requested.join(", ")),
        format!("{} {}", "Loading:".green(), report.loaded.join(", ")),
    ];

    if !report.auto_added.is_empty() {
        lines.push("Auto-resolved dependencies:".yellow().to_string());
        for entry in &report.auto_added {
            let requirers: Vec<&str> = entry.required_by.iter().map(String::as_str).collect();
            lines.push(format!(
                "  {} (required by {})",
                entry.module,
                requirers.join(", ")
            ));
        }
    }
    for module in &report.backend_modules {
        lines.push(format!("  {} {module}", "backend".dimmed()));
    }

    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    lines.push(format!("{} {}", "Theme:".cyan(), or_dash(report.theme.as_deref())));
    lines.push(format!("{} {}", "Site:".cyan(), or_dash(report.site_name.as_deref())));
    lines.push(format!(
        "{} {}",
        "Dashboard:".cyan(),
        or_dash(report.dashboard_type.as_deref())
    ));
    lines.push(format!("{} {}", "Routes:".cyan(), report.route_count));
    lines.join("\n")
}

#[must_use]
pub fn render_routes(routes: &RouteTable) -> String {
    let mut lines = Vec::with_capacity(routes.len());
    for route in routes.routes() {
        let methods: Vec<&str> = route.methods().iter().map(http::Method::as_str).collect();
        lines.push(format!(
            "{:<10} {:<32} {:<18} {}",
            methods.join(","),
            route.pattern().canonical(),
            route.endpoint(),
            route.module().dimmed()
        ));
    }
    lines.join("\n")
}

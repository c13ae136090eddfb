// src/cli/stats.rs — Statistics display

use crate::api::types::{Priority, TaskStats};
use crate::api::TaskApi;

/// Handle `taskmaster stats`.
pub async fn show_stats(api: &dyn TaskApi) -> anyhow::Result<()> {
    let stats = api.stats().await.map_err(|e| anyhow::anyhow!("{}", e.detail()))?;
    print!("{}", render_stats(&stats));
    Ok(())
}

pub fn render_stats(stats: &TaskStats) -> String {
    let o = &stats.overview;
    let t = &stats.time_metrics;
    let mut out = String::new();

    out.push_str("  Overview:\n");
    out.push_str(&format!("    Total tasks:     {}\n", o.total_tasks));
    out.push_str(&format!(
        "    Completed:       {} ({}%)\n",
        o.completed_tasks,
        stats.completed_percent()
    ));
    out.push_str(&format!(
        "    Pending:         {} ({}%)\n",
        o.pending_tasks,
        stats.pending_percent()
    ));
    out.push_str(&format!(
        "    Avg completion:  {:.1} hrs\n",
        t.average_completion_time
    ));

    out.push('\n');
    out.push_str("  Pending time:\n");
    out.push_str(&format!("    Time lapsed:     {:.1} hrs\n", t.total_time_elapsed));
    out.push_str(&format!("    Time to finish:  {:.1} hrs\n", t.total_time_to_finish));

    out.push('\n');
    out.push_str("  Pending by priority:\n");
    out.push_str(&format!(
        "    {:<8}  {:>7}  {:>12}  {:>12}\n",
        "Priority", "Pending", "Lapsed (h)", "Left (h)"
    ));
    for priority in Priority::ALL_DESC {
        let row = stats.pending_for(priority);
        out.push_str(&format!(
            "    {:<8}  {:>7}  {:>12.1}  {:>12.1}\n",
            priority, row.count, row.time_elapsed, row.estimated_time_left
        ));
    }
    out
}

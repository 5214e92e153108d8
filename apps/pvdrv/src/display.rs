//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use pvdrv_ops::{GateReport, HardwareIdBinding, OperationResult, StatusReport};
use pvdrv_types::{CleanupReport, ColorChoice, InstallReport, StageReport};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::InstallReport(report) => self.render_install_report(report),
            OperationResult::StageReport(report) => self.render_stage_report(report),
            OperationResult::HardwareIdBinding(binding) => self.render_binding(binding),
            OperationResult::CleanupReport(report) => self.render_cleanup_report(report),
            OperationResult::Gate(gate) => self.render_gate(gate),
            OperationResult::Status(status) => self.render_status(status),
        }
    }

    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        if report.installed.is_empty() && report.failed.is_empty() {
            println!("All drivers already installed.");
            return Ok(());
        }

        let mut table = new_table(&["Driver", "Result", "Detail"]);
        for driver in &report.installed {
            table.add_row(vec![
                Cell::new(driver),
                self.result_cell("installed", true),
                Cell::new(""),
            ]);
        }
        for driver in &report.skipped {
            table.add_row(vec![
                Cell::new(driver),
                Cell::new("already installed"),
                Cell::new(""),
            ]);
        }
        for failure in &report.failed {
            table.add_row(vec![
                Cell::new(&failure.driver),
                self.result_cell("failed", false),
                Cell::new(&failure.error),
            ]);
        }

        println!("{table}");
        self.render_reboot_notice(report.reboot_required);
        println!("Completed in {}ms", report.duration_ms);
        Ok(())
    }

    fn render_stage_report(&self, report: &StageReport) -> io::Result<()> {
        let mut table = new_table(&["Driver", "Staged"]);
        for driver in &report.staged {
            table.add_row(vec![Cell::new(driver), self.result_cell("yes", true)]);
        }
        for driver in &report.failed {
            table.add_row(vec![Cell::new(driver), self.result_cell("no", false)]);
        }

        println!("{table}");
        println!("Completed in {}ms", report.duration_ms);
        Ok(())
    }

    fn render_binding(&self, binding: &HardwareIdBinding) -> io::Result<()> {
        println!(
            "Bound {} to {} ({})",
            self.style_name(&binding.driver),
            binding.hardware_id,
            binding.device
        );
        self.render_reboot_notice(binding.reboot_required);
        Ok(())
    }

    fn render_cleanup_report(&self, report: &CleanupReport) -> io::Result<()> {
        let mut table = new_table(&["Stage", "Result"]);
        for stage in &report.skipped {
            table.add_row(vec![Cell::new(stage), Cell::new("already done")]);
        }
        for stage in &report.completed {
            table.add_row(vec![Cell::new(stage), self.result_cell("completed", true)]);
        }
        println!("{table}");

        if !report.products_removed.is_empty() {
            println!();
            println!("Products removed ({}):", report.products_removed.len());
            for code in &report.products_removed {
                println!("  - {code}");
            }
        }

        if !report.warnings.is_empty() {
            println!();
            println!("Warnings ({}):", report.warnings.len());
            for warning in &report.warnings {
                println!("  - {warning}");
            }
        }

        self.render_reboot_notice(report.reboot_required);
        println!("Completed in {}ms", report.duration_ms);
        Ok(())
    }

    fn render_gate(&self, gate: &GateReport) -> io::Result<()> {
        if gate.cleared {
            println!("No device installs pending.");
        } else {
            println!(
                "{}",
                self.warn_text(&format!(
                    "Device installs still pending after {}.",
                    gate.timeout
                ))
            );
        }
        Ok(())
    }

    fn render_status(&self, status: &StatusReport) -> io::Result<()> {
        let mut table = new_table(&["Milestone", "Set", "Recorded"]);
        for entry in &status.milestones {
            let recorded = entry.set_at.map_or_else(
                || "-".to_string(),
                |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            table.add_row(vec![
                Cell::new(entry.milestone),
                self.result_cell(if entry.set { "yes" } else { "no" }, entry.set),
                Cell::new(recorded),
            ]);
        }

        println!("{table}");
        println!(
            "{} of {} milestones recorded",
            status.completed(),
            status.milestones.len()
        );
        Ok(())
    }

    fn render_reboot_notice(&self, reboot_required: bool) {
        if reboot_required {
            println!("{}", self.warn_text("A reboot is required to finish."));
        }
    }

    fn result_cell(&self, text: &str, ok: bool) -> Cell {
        let cell = Cell::new(text);
        if !self.supports_color() {
            return cell;
        }
        if ok {
            cell.fg(Color::Green)
        } else {
            cell.fg(Color::Red)
        }
    }

    fn style_name(&self, name: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(name).to_string()
        } else {
            name.to_string()
        }
    }

    fn warn_text(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().yellow().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

use console::{strip_ansi_codes, Term};
use owo_colors::OwoColorize;
use unicode_width::UnicodeWidthStr;

use crate::employees::Employee;

/// Enhanced UI utilities
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    /// Print a success message (color only if supported)
    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    /// Print an error message (color only if supported)
    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    /// Print a warning message (color only if supported)
    pub fn warning(&self, message: &str) {
        let output = self.colorize(message, |m| m.yellow().bold().to_string());
        println!("{}", output);
    }

    /// Print an info message (color only if supported)
    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Format authentication status with appropriate color (if supported)
    pub fn format_auth_status(&self, authenticated: bool, expired: bool) -> String {
        let text = if authenticated && !expired {
            "Authenticated"
        } else if authenticated {
            "Session expired"
        } else {
            "Not authenticated"
        };

        if self.supports_color() {
            if authenticated && !expired {
                text.green().to_string()
            } else if authenticated {
                text.yellow().to_string()
            } else {
                text.red().to_string()
            }
        } else {
            text.to_string()
        }
    }

    /// Format an active/inactive flag with appropriate color (if supported)
    pub fn format_active_status(&self, active: bool) -> String {
        let text = if active { "Activo" } else { "Inactivo" };
        if self.supports_color() {
            if active {
                text.green().to_string()
            } else {
                text.red().to_string()
            }
        } else {
            text.to_string()
        }
    }

    /// Format an optional field with fallback for missing data
    pub fn format_field(&self, value: Option<String>) -> String {
        match value {
            Some(v) if !v.is_empty() => v,
            _ => "-".to_string(),
        }
    }

    /// Print a blank line for spacing
    pub fn blank_line(&self) {
        println!();
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let term_width = self.width();
        let card_width = term_width
            .saturating_sub(4) // Leave more space for terminal margins
            .clamp(50, 80); // Minimum and maximum width

        let supports_color = self.supports_color();

        // Card header
        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_width = title.width();
        let title_spaces = card_width.saturating_sub(title_width + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        // Card content
        for (label, value) in content {
            // Strip ANSI codes for width calculations
            let label_plain = strip_ansi_codes(label);
            let value_plain = strip_ansi_codes(&value);

            let label_width = label_plain.width();
            let value_width = value_plain.width();
            let content_width = label_width + value_width + 4; // ": " + 2 spaces padding

            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1 // At least one space
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        // Card footer
        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// Print an employee listing as an aligned table.
    pub fn employee_table(&self, employees: &[Employee]) {
        let headers = ["Núm.", "Nombre", "Departamento", "Celular", "Estatus"];
        let rows: Vec<[String; 5]> = employees
            .iter()
            .map(|e| {
                [
                    e.num_empleado.clone(),
                    e.full_name(),
                    self.format_field(e.departamento_nombre.clone()),
                    self.format_field(e.celular.clone()),
                    e.status_label().to_string(),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let supports_color = self.supports_color();
        let header_line = headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad_cell(h, widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        if supports_color {
            println!("{}", header_line.bold());
        } else {
            println!("{}", header_line);
        }
        println!("{}", "─".repeat(widths.iter().sum::<usize>() + 8));

        for (row, employee) in rows.iter().zip(employees) {
            let mut cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, c)| pad_cell(c, widths[i]))
                .collect();
            if supports_color {
                let status = cells.pop().unwrap_or_default();
                let status = if employee.activo {
                    status.green().to_string()
                } else {
                    status.red().to_string()
                };
                cells.push(status);
            }
            println!("{}", cells.join("  "));
        }
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad a cell to `width` display columns, unicode-aware.
fn pad_cell(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(padding))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod unit {
        use super::*;

        #[test]
        fn pad_cell_counts_display_width() {
            assert_eq!(pad_cell("ab", 4), "ab  ");
            // 'í' is one display column even though it is two bytes.
            assert_eq!(pad_cell("Producción", 12), "Producción  ");
        }

        #[test]
        fn format_field_falls_back_to_dash() {
            let ui = UI::new();
            assert_eq!(ui.format_field(None), "-");
            assert_eq!(ui.format_field(Some(String::new())), "-");
            assert_eq!(ui.format_field(Some("x".to_string())), "x");
        }
    }
}

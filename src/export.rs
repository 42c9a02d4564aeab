//! CSV export of employee listings.

use std::path::Path;

use crate::employees::Employee;
use crate::error::{KardexError, Result};

/// Column headers, matching the roster spreadsheet HR circulates.
const HEADERS: &[&str] = &[
    "Núm.",
    "Nombre(s)",
    "A. Paterno",
    "A. Materno",
    "Departamento",
    "Celular",
    "Estatus",
];

/// Write the given employees to `path` as CSV. Returns the number of
/// records written.
pub fn write_csv(path: &Path, employees: &[Employee]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KardexError::io(format!("creating export directory {}", parent.display()), e)
            })?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        KardexError::file_write(format!("opening {}", path.display()), e.to_string())
    })?;

    writer.write_record(HEADERS)?;
    for employee in employees {
        writer.write_record(record_for(employee))?;
    }
    writer
        .flush()
        .map_err(|e| KardexError::io(format!("writing {}", path.display()), e))?;

    Ok(employees.len())
}

fn record_for(employee: &Employee) -> [String; 7] {
    [
        employee.num_empleado.clone(),
        employee.nombres.clone(),
        employee.apellido_paterno.clone(),
        employee.apellido_materno.clone().unwrap_or_default(),
        employee.departamento_nombre.clone().unwrap_or_default(),
        employee.celular.clone().unwrap_or_default(),
        employee.status_label().to_string(),
    ]
}

/// Default export file name, stamped with the current date.
pub fn default_file_name() -> String {
    format!("empleados_{}.csv", chrono::Local::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::employee_json;

    fn employee(id: u64, num: &str, nombres: &str) -> Employee {
        serde_json::from_value(employee_json(id, num, nombres)).unwrap()
    }

    mod unit {
        use super::*;

        #[test]
        fn writes_headers_and_rows() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("empleados.csv");

            let mut inactive = employee(2, "E-002", "Juan");
            inactive.activo = false;
            inactive.apellido_materno = Some("López".to_string());

            let written =
                write_csv(&path, &[employee(1, "E-001", "María"), inactive]).unwrap();
            assert_eq!(written, 2);

            let content = std::fs::read_to_string(&path).unwrap();
            let mut lines = content.lines();
            assert_eq!(
                lines.next().unwrap(),
                "Núm.,Nombre(s),A. Paterno,A. Materno,Departamento,Celular,Estatus"
            );
            assert_eq!(
                lines.next().unwrap(),
                "E-001,María,García,,Producción,555-010-2030,Activo"
            );
            assert_eq!(
                lines.next().unwrap(),
                "E-002,Juan,García,López,Producción,555-010-2030,Inactivo"
            );
        }

        #[test]
        fn quotes_fields_containing_commas() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("empleados.csv");

            let mut emp = employee(1, "E-001", "María");
            emp.departamento_nombre = Some("Ventas, Norte".to_string());
            write_csv(&path, &[emp]).unwrap();

            let content = std::fs::read_to_string(&path).unwrap();
            assert!(content.contains("\"Ventas, Norte\""));
        }

        #[test]
        fn creates_missing_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("reports").join("empleados.csv");

            write_csv(&path, &[employee(1, "E-001", "María")]).unwrap();
            assert!(path.exists());
        }

        #[test]
        fn empty_listing_yields_headers_only() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("empleados.csv");

            let written = write_csv(&path, &[]).unwrap();
            assert_eq!(written, 0);

            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.lines().count(), 1);
        }

        #[test]
        fn default_name_carries_date_stamp() {
            let name = default_file_name();
            assert!(name.starts_with("empleados_"));
            assert!(name.ends_with(".csv"));
        }
    }
}

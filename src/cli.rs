use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::auth::AuthService;
use crate::client::{Gateway, HttpTransport};
use crate::config::CliConfig;
use crate::employees::{EmployeeService, ListParams};
use crate::error::{KardexError, Result};
use crate::ui::UI;
use crate::{
    Commands, ConfigArgs, ConfigCommand, CreateArgs, ExportArgs, ListArgs, LoginArgs, RemoveArgs,
    ShowArgs, UpdateArgs,
};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
        }
    }

    /// Load configuration using the handler's config path
    async fn load_config(&self) -> Result<CliConfig> {
        CliConfig::load(self.config_path.as_deref()).await
    }

    /// Build the gateway for the current configuration. The session
    /// expiry hook prints a hint instead of redirecting; there is no
    /// page to navigate to in a CLI.
    async fn gateway(&self) -> Result<Gateway<HttpTransport>> {
        let config = self.load_config().await?;
        let client_config = config.to_client_config()?;
        Ok(Gateway::new(client_config)?.on_session_expired(|| {
            eprintln!("Session expired. Run `kardex login` to sign in again.");
        }))
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => self.handle_login(args).await,
            Commands::Logout => self.handle_logout().await,
            Commands::Status => self.handle_status().await,
            Commands::List(args) => self.handle_list(args).await,
            Commands::Show(args) => self.handle_show(args).await,
            Commands::Create(args) => self.handle_create(args).await,
            Commands::Update(args) => self.handle_update(args).await,
            Commands::Remove(args) => self.handle_remove(args).await,
            Commands::Export(args) => self.handle_export(args).await,
            Commands::Config(args) => self.handle_config(args).await,
        }
    }

    /// Handle login command
    async fn handle_login(&mut self, args: LoginArgs) -> Result<()> {
        let username = match args.username {
            Some(username) => username,
            None => prompt_line("Username: ")?,
        };
        if username.is_empty() {
            return Err(KardexError::invalid_input("username cannot be empty"));
        }
        let password = rpassword::prompt_password("Password: ")
            .map_err(|e| KardexError::invalid_input(format!("cannot read password: {}", e)))?;

        let gateway = self.gateway().await?;
        let session = AuthService::new(&gateway).login(&username, &password).await?;

        match session {
            Some(session) => {
                self.ui
                    .success(&format!("Logged in as {}", session.subject));
                if !session.roles.is_empty() {
                    self.ui.info(&format!("Roles: {}", session.roles.join(", ")));
                }
            }
            None => self.ui.success("Logged in"),
        }
        Ok(())
    }

    /// Handle logout command
    async fn handle_logout(&mut self) -> Result<()> {
        let gateway = self.gateway().await?;
        AuthService::new(&gateway).logout()?;
        self.ui.success("Logged out");
        Ok(())
    }

    /// Handle status command
    async fn handle_status(&mut self) -> Result<()> {
        let gateway = self.gateway().await?;
        let status = AuthService::new(&gateway).status();

        let mut fields = vec![
            ("Version", status.version),
            (
                "Authentication",
                self.ui
                    .format_auth_status(status.authenticated, status.expired),
            ),
        ];
        if let Some(session) = &status.session {
            fields.push(("User", session.subject.clone()));
            if !session.roles.is_empty() {
                fields.push(("Roles", session.roles.join(", ")));
            }
            if let Some(expires_at) = session.expires_at {
                fields.push(("Expires", expires_at.to_rfc3339()));
            }
        }
        fields.push(("Endpoint", status.endpoint));

        self.ui.card("Status", fields);
        Ok(())
    }

    /// Handle list command
    async fn handle_list(&mut self, args: ListArgs) -> Result<()> {
        let gateway = self.gateway().await?;
        let service = EmployeeService::new(&gateway);
        let page = service.list(&args.to_params()).await?;

        if page.items.is_empty() {
            self.ui.info("No employees found");
            return Ok(());
        }

        self.ui.employee_table(&page.items);
        self.ui.blank_line();
        match page.total {
            Some(total) => self
                .ui
                .info(&format!("Showing {} of {} employees", page.items.len(), total)),
            None => self.ui.info(&format!("{} employees", page.items.len())),
        }
        Ok(())
    }

    /// Handle show command
    async fn handle_show(&mut self, args: ShowArgs) -> Result<()> {
        let gateway = self.gateway().await?;
        let employee = EmployeeService::new(&gateway).get(args.id).await?;

        let fields = vec![
            ("Núm.", employee.num_empleado.clone()),
            ("Nombre", employee.full_name()),
            (
                "Departamento",
                self.ui.format_field(employee.departamento_nombre.clone()),
            ),
            ("Puesto", self.ui.format_field(employee.puesto_nombre.clone())),
            ("CURP", self.ui.format_field(employee.curp.clone())),
            ("RFC", self.ui.format_field(employee.rfc.clone())),
            ("NSS", self.ui.format_field(employee.nss.clone())),
            ("Celular", self.ui.format_field(employee.celular.clone())),
            ("Email", self.ui.format_field(employee.email.clone())),
            (
                "Ingreso",
                self.ui.format_field(employee.fecha_ingreso.clone()),
            ),
            ("Estatus", self.ui.format_active_status(employee.activo)),
        ];
        self.ui
            .card(&format!("Empleado #{}", employee.id), fields);
        Ok(())
    }

    /// Handle create command
    async fn handle_create(&mut self, args: CreateArgs) -> Result<()> {
        let payload = read_json_file(&args.file)?;
        self.print_validation_warnings(&payload);

        let gateway = self.gateway().await?;
        let employee = EmployeeService::new(&gateway).create(payload).await?;
        self.ui.success(&format!(
            "Created employee {} ({})",
            employee.num_empleado,
            employee.full_name()
        ));
        Ok(())
    }

    /// Handle update command
    async fn handle_update(&mut self, args: UpdateArgs) -> Result<()> {
        let payload = read_json_file(&args.file)?;
        self.print_validation_warnings(&payload);

        let gateway = self.gateway().await?;
        let employee = EmployeeService::new(&gateway)
            .update(args.id, payload, args.replace)
            .await?;
        self.ui
            .success(&format!("Updated employee {}", employee.num_empleado));
        Ok(())
    }

    /// Handle remove command
    async fn handle_remove(&mut self, args: RemoveArgs) -> Result<()> {
        if !args.force {
            let answer = prompt_line(&format!("Delete employee {}? [y/N] ", args.id))?;
            if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
                self.ui.info("Aborted");
                return Ok(());
            }
        }

        let gateway = self.gateway().await?;
        EmployeeService::new(&gateway).delete(args.id).await?;
        self.ui.success(&format!("Deleted employee {}", args.id));
        Ok(())
    }

    /// Handle export command
    async fn handle_export(&mut self, args: ExportArgs) -> Result<()> {
        let gateway = self.gateway().await?;
        let service = EmployeeService::new(&gateway);
        let employees = service.list_all(&args.list.to_params()).await?;

        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(crate::export::default_file_name()));
        let written = crate::export::write_csv(&path, &employees)?;
        self.ui.success(&format!(
            "Exported {} employees to {}",
            written,
            path.display()
        ));
        Ok(())
    }

    /// Handle config command
    async fn handle_config(&mut self, args: ConfigArgs) -> Result<()> {
        let mut config = self.load_config().await?;
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => crate::config::default_config_path(),
        };

        match args.command {
            ConfigCommand::Show => {
                self.ui.card(
                    "Configuration",
                    vec![
                        ("Endpoint", config.endpoint.clone()),
                        ("Timeout", format!("{}s", config.timeout)),
                        ("Verbose", config.verbose.to_string()),
                        ("Storage", config.storage_dir.display().to_string()),
                        ("File", path.display().to_string()),
                    ],
                );
            }
            ConfigCommand::SetEndpoint { url } => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(KardexError::invalid_endpoint(format!(
                        "endpoint must start with http:// or https://: {}",
                        url
                    )));
                }
                config.endpoint = url;
                config.save(&path).await?;
                self.ui.success("Endpoint updated");
            }
            ConfigCommand::SetTimeout { seconds } => {
                if seconds == 0 {
                    return Err(KardexError::invalid_input("timeout must be positive"));
                }
                config.timeout = seconds;
                config.save(&path).await?;
                self.ui.success("Timeout updated");
            }
            ConfigCommand::SetVerbose { enabled } => {
                config.verbose = match enabled.to_lowercase().as_str() {
                    "true" | "on" | "1" => true,
                    "false" | "off" | "0" => false,
                    other => {
                        return Err(KardexError::invalid_input(format!(
                            "expected true or false, got {}",
                            other
                        )))
                    }
                };
                config.save(&path).await?;
                self.ui.success("Verbose updated");
            }
            ConfigCommand::Reset => {
                config = CliConfig::default();
                config.save(&path).await?;
                self.ui.success("Configuration reset to defaults");
            }
        }
        Ok(())
    }

    fn print_validation_warnings(&self, payload: &serde_json::Value) {
        for warning in crate::validators::collect_warnings(payload) {
            self.ui.warning(&warning);
        }
    }
}

impl ListArgs {
    fn to_params(&self) -> ListParams {
        ListParams {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            ordering: self.ordering.clone(),
            departamento: self.departamento,
            puesto: self.puesto,
            activo: if self.all {
                None
            } else if self.inactive {
                Some(false)
            } else {
                Some(true)
            },
        }
    }
}

fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| KardexError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| {
        KardexError::invalid_input(format!("{} is not valid JSON: {}", path.display(), e))
    })
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout()
        .flush()
        .map_err(|e| KardexError::invalid_input(format!("cannot write prompt: {}", e)))?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| KardexError::invalid_input(format!("cannot read input: {}", e)))?;
    debug!("read {} bytes from stdin", line.len());
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod unit {
        use super::*;

        fn list_args() -> ListArgs {
            ListArgs {
                search: None,
                ordering: None,
                departamento: None,
                puesto: None,
                page: None,
                page_size: None,
                inactive: false,
                all: false,
            }
        }

        #[test]
        fn list_defaults_to_active_employees() {
            assert_eq!(list_args().to_params().activo, Some(true));
        }

        #[test]
        fn inactive_and_all_flags_adjust_filter() {
            let mut args = list_args();
            args.inactive = true;
            assert_eq!(args.to_params().activo, Some(false));

            let mut args = list_args();
            args.all = true;
            assert_eq!(args.to_params().activo, None);
        }

        #[test]
        fn json_file_reading_reports_bad_content() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("empleado.json");

            assert!(read_json_file(&path).is_err());

            std::fs::write(&path, "{broken").unwrap();
            assert!(read_json_file(&path).is_err());

            std::fs::write(&path, r#"{"nombres": "María"}"#).unwrap();
            let value = read_json_file(&path).unwrap();
            assert_eq!(value["nombres"], "María");
        }
    }
}

//! Employee records: wire model, list normalization and CRUD calls.
//!
//! Field names follow the backend API verbatim. The list endpoint may
//! answer with a bare array or a DRF-style pagination envelope; both
//! are normalized into [`EmployeePage`] before anything else sees them.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};

use crate::client::{Gateway, Transport};
use crate::error::{KardexError, Result};

/// Employee record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub num_empleado: String,
    pub nombres: String,
    pub apellido_paterno: String,
    #[serde(default)]
    pub apellido_materno: Option<String>,

    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub genero: Option<String>,
    #[serde(default)]
    pub estado_civil: Option<String>,

    #[serde(default)]
    pub curp: Option<String>,
    #[serde(default)]
    pub rfc: Option<String>,
    #[serde(default)]
    pub nss: Option<String>,

    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub calle: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub colonia: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub cp: Option<String>,

    #[serde(default)]
    pub departamento_id: Option<u64>,
    #[serde(default)]
    pub departamento_nombre: Option<String>,
    #[serde(default)]
    pub puesto_id: Option<u64>,
    #[serde(default)]
    pub puesto_nombre: Option<String>,
    #[serde(default)]
    pub turno_id: Option<u64>,
    #[serde(default)]
    pub horario_id: Option<u64>,

    #[serde(default)]
    pub fecha_ingreso: Option<String>,
    #[serde(default = "default_activo")]
    pub activo: bool,

    /// DRF serializes decimals as strings; some backends send numbers.
    #[serde(default, deserialize_with = "decimal_as_string")]
    pub sueldo: Option<String>,

    #[serde(default)]
    pub tipo_contrato: Option<String>,
    #[serde(default)]
    pub tipo_jornada: Option<String>,

    #[serde(default)]
    pub banco: Option<String>,
    #[serde(default)]
    pub clabe: Option<String>,
    #[serde(default)]
    pub cuenta: Option<String>,

    #[serde(default)]
    pub contacto_emergencia_nombre: Option<String>,
    #[serde(default)]
    pub contacto_emergencia_parentesco: Option<String>,
    #[serde(default)]
    pub contacto_emergencia_telefono: Option<String>,

    #[serde(default)]
    pub escolaridad: Option<String>,
    #[serde(default)]
    pub notas: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

fn default_activo() -> bool {
    true
}

fn decimal_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl Employee {
    pub fn full_name(&self) -> String {
        let mut name = format!("{} {}", self.nombres, self.apellido_paterno);
        if let Some(materno) = &self.apellido_materno {
            if !materno.is_empty() {
                name.push(' ');
                name.push_str(materno);
            }
        }
        name
    }

    pub fn status_label(&self) -> &'static str {
        if self.activo {
            "Activo"
        } else {
            "Inactivo"
        }
    }
}

/// Normalized listing, whatever shape the backend chose.
#[derive(Debug, Clone)]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    pub total: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListWire {
    Paginated {
        count: u64,
        next: Option<String>,
        previous: Option<String>,
        results: Vec<Employee>,
    },
    Plain(Vec<Employee>),
}

impl From<ListWire> for EmployeePage {
    fn from(wire: ListWire) -> Self {
        match wire {
            ListWire::Plain(items) => Self {
                items,
                total: None,
                next: None,
                previous: None,
            },
            ListWire::Paginated {
                count,
                next,
                previous,
                results,
            } => Self {
                items: results,
                total: Some(count),
                next,
                previous,
            },
        }
    }
}

/// Listing filters; everything optional.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub departamento: Option<u64>,
    pub puesto: Option<u64>,
    pub activo: Option<bool>,
}

impl ListParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(ordering) = &self.ordering {
            query.push(("ordering".to_string(), ordering.clone()));
        }
        if let Some(departamento) = self.departamento {
            query.push(("departamento".to_string(), departamento.to_string()));
        }
        if let Some(puesto) = self.puesto {
            query.push(("puesto".to_string(), puesto.to_string()));
        }
        if let Some(activo) = self.activo {
            query.push(("activo".to_string(), activo.to_string()));
        }
        query
    }
}

/// Keys the UI layer may carry that the backend does not accept.
const DISPLAY_ONLY_KEYS: &[&str] = &[
    "departamento_nombre",
    "puesto_nombre",
    "turno_nombre",
    "horario_nombre",
    "genero_display",
    "estado_civil_display",
    "escolaridad_display",
];

/// Align a create/update payload with what the backend expects:
/// `genero` uppercased, choice fields lowercased, display-only keys
/// dropped. `escolaridad` is free text and keeps its casing.
pub fn normalize_for_submit(payload: serde_json::Value) -> serde_json::Value {
    let serde_json::Value::Object(map) = payload else {
        return payload;
    };

    let mut out = serde_json::Map::new();
    for (key, value) in map {
        if DISPLAY_ONLY_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("genero", serde_json::Value::String(s)) => {
                serde_json::Value::String(s.to_uppercase())
            }
            ("estado_civil" | "tipo_contrato" | "tipo_jornada", serde_json::Value::String(s)) => {
                serde_json::Value::String(s.to_lowercase())
            }
            (_, value) => value,
        };
        out.insert(key, value);
    }
    serde_json::Value::Object(out)
}

fn require_object(input: serde_json::Value) -> Result<serde_json::Value> {
    if input.is_object() {
        Ok(input)
    } else {
        Err(KardexError::validation_field(
            "must be a JSON object",
            "payload",
        ))
    }
}

/// Page size used when walking every page for export.
const EXPORT_PAGE_SIZE: u64 = 200;

/// CRUD operations over the gateway. All 401 handling lives in the
/// gateway; this layer only maps non-success replies to errors.
pub struct EmployeeService<'a, T: Transport> {
    gateway: &'a Gateway<T>,
}

impl<'a, T: Transport> EmployeeService<'a, T> {
    pub fn new(gateway: &'a Gateway<T>) -> Self {
        Self { gateway }
    }

    fn base_path(&self) -> String {
        self.gateway.config().employees_path.clone()
    }

    fn detail_path(&self, id: u64) -> String {
        format!("{}{}/", self.base_path(), id)
    }

    pub async fn list(&self, params: &ListParams) -> Result<EmployeePage> {
        let reply = self
            .gateway
            .execute(Method::GET, &self.base_path(), params.to_query(), None)
            .await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }
        let wire: ListWire = reply.json()?;
        Ok(wire.into())
    }

    /// Walk every page of the filtered listing, for export.
    pub async fn list_all(&self, params: &ListParams) -> Result<Vec<Employee>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let page_params = ListParams {
                page: Some(page),
                page_size: Some(EXPORT_PAGE_SIZE),
                ..params.clone()
            };
            let listing = self.list(&page_params).await?;
            all.extend(listing.items);
            if listing.next.is_none() {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    pub async fn get(&self, id: u64) -> Result<Employee> {
        let reply = self
            .gateway
            .execute(Method::GET, &self.detail_path(id), Vec::new(), None)
            .await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }
        reply.json()
    }

    pub async fn create(&self, input: serde_json::Value) -> Result<Employee> {
        let body = normalize_for_submit(require_object(input)?);
        let reply = self
            .gateway
            .execute(Method::POST, &self.base_path(), Vec::new(), Some(body))
            .await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }
        reply.json()
    }

    /// Update a record. `replace` switches from partial (PATCH) to
    /// full (PUT) semantics.
    pub async fn update(
        &self,
        id: u64,
        input: serde_json::Value,
        replace: bool,
    ) -> Result<Employee> {
        let method = if replace { Method::PUT } else { Method::PATCH };
        let body = normalize_for_submit(require_object(input)?);
        let reply = self
            .gateway
            .execute(method, &self.detail_path(id), Vec::new(), Some(body))
            .await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }
        reply.json()
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        let reply = self
            .gateway
            .execute(Method::DELETE, &self.detail_path(id), Vec::new(), None)
            .await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }
        Ok(())
    }
}

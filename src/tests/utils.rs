//! Test fixture helpers.

#[cfg(test)]
pub mod test_helpers {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    /// Build a compact JWT-shaped token around the given claims. The
    /// signature segment is junk; session decoding never verifies it.
    pub fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.sig", header, payload)
    }

    /// Minimal employee JSON as the backend would return it.
    pub fn employee_json(id: u64, num: &str, nombres: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "num_empleado": num,
            "nombres": nombres,
            "apellido_paterno": "García",
            "apellido_materno": null,
            "fecha_nacimiento": "1990-04-12",
            "genero": "F",
            "estado_civil": "soltero",
            "curp": null,
            "rfc": null,
            "nss": null,
            "telefono": null,
            "celular": "555-010-2030",
            "email": null,
            "calle": null,
            "numero": null,
            "colonia": null,
            "municipio": null,
            "estado": null,
            "cp": null,
            "departamento_id": 3,
            "departamento_nombre": "Producción",
            "puesto_id": null,
            "turno_id": null,
            "horario_id": null,
            "fecha_ingreso": "2020-01-15",
            "activo": true,
            "sueldo": "12500.00",
            "tipo_contrato": "indeterminado",
            "tipo_jornada": "diurna",
            "banco": null,
            "clabe": null,
            "cuenta": null,
            "contacto_emergencia_nombre": null,
            "contacto_emergencia_parentesco": null,
            "contacto_emergencia_telefono": null,
            "escolaridad": null,
            "notas": null,
            "foto": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "deleted_at": null
        })
    }
}

//! The authority's issuance response.
//!
//! The JSON shape is owned by the authority and preserved exactly: binary
//! fields are base64 strings (`cert`, `tls_cert`, `tls_ca_certs`, and an
//! optional `key` that is only populated when the authority generated the
//! key pair itself, i.e. on the local issuance path).

use serde::{Deserialize, Serialize};

/// Certificates issued by the cluster authority for one host.
///
/// Consumed exactly once to assemble an [`Identity`](crate::Identity); a
/// bundle is never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBundle {
    /// PEM private key, present only when the authority generated the key
    /// pair (local issuance). Network joins keep the key caller-side.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub key: Option<Vec<u8>>,

    /// SSH host certificate
    #[serde(rename = "cert", with = "base64_bytes")]
    pub ssh_cert: Vec<u8>,

    /// X.509 certificate (PEM)
    #[serde(with = "base64_bytes")]
    pub tls_cert: Vec<u8>,

    /// CA certificates that signed `tls_cert`, in chain order
    #[serde(with = "base64_bytes_vec")]
    pub tls_ca_certs: Vec<Vec<u8>>,
}

/// Serde adapter encoding `Vec<u8>` as a standard-alphabet base64 string,
/// matching the authority's JSON encoding of binary fields.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Vec<u8>>` as an optional base64 string.
pub mod base64_bytes_opt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, ser: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => ser.serialize_some(&STANDARD.encode(b)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(de)?;
        s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Serde adapter for `Vec<Vec<u8>>` as a list of base64 strings.
pub mod base64_bytes_vec {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(list: &[Vec<u8>], ser: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = list.iter().map(|b| STANDARD.encode(b)).collect();
        serde::Serialize::serialize(&encoded, ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(de)?;
        encoded
            .iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

pub mod form;
pub mod geo;
pub mod incident;

pub use form::{FieldKey, FormFields, ImageAttachment, ValidationErrors};
pub use geo::GeoPoint;
pub use incident::{parse_incident_list, Incident, IncidentId, IncidentType};

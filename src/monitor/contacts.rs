use serde::Serialize;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EmergencyContact {
    pub id: u32,
    pub name: String,
    pub phone: String,
    pub relation: String,
}

impl EmergencyContact {
    pub fn new(id: u32, name: &str, phone: &str, relation: &str) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            relation: relation.into(),
        }
    }
}

pub fn default_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact::new(1, "Priya Sharma", "+91 98765 43210", "Spouse"),
        EmergencyContact::new(2, "Arjun Singh", "+91 87654 32109", "Brother"),
        EmergencyContact::new(3, "Dr. Ramesh Gupta", "+91 76543 21098", "Family Doctor"),
    ]
}

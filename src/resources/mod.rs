//! REST resources behind the CRUD screens
//!
//! Every resource has the same shape: list (with search and scope filters), get,
//! create, update and delete. [`ResourceApi`] implements that shape once; each
//! resource module only declares its types, its validation and its table columns.

mod clinic;
mod examination;
mod patient;
mod product;
mod sale;
pub mod screen;
mod user;
pub mod validation;
mod visit;

pub use clinic::{Clinic, ClinicDraft};
pub use examination::{EyeMeasurement, Examination, ExaminationDraft};
pub use patient::{Patient, PatientDraft};
pub use product::{Product, ProductDraft};
pub use sale::{PaymentMethod, Sale, SaleDraft, SaleItem};
pub use screen::{FetchOutcome, ListScreen, ListView};
pub use user::{UserAccount, UserDraft};
pub use validation::{Validate, ValidationErrors};
pub use visit::{Visit, VisitDraft, VisitStatus};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

use crate::api::ApiClient;
use crate::auth::Role;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Patients,
    Visits,
    Examinations,
    Sales,
    Products,
    Users,
    Clinics,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Patients,
        ResourceKind::Visits,
        ResourceKind::Examinations,
        ResourceKind::Sales,
        ResourceKind::Products,
        ResourceKind::Users,
        ResourceKind::Clinics,
    ];

    /// Path segment, shared by the REST endpoint and the page route
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::Patients => "patients",
            ResourceKind::Visits => "visits",
            ResourceKind::Examinations => "examinations",
            ResourceKind::Sales => "sales",
            ResourceKind::Products => "products",
            ResourceKind::Users => "users",
            ResourceKind::Clinics => "clinics",
        }
    }

    pub fn endpoint(&self) -> String {
        format!("/{}", self.segment())
    }

    /// Roles whose area offers this screen
    pub fn areas(&self) -> &'static [Role] {
        match self {
            ResourceKind::Patients => &[
                Role::Admin,
                Role::ClinicManager,
                Role::Secretary,
                Role::Doctor,
                Role::Optician,
            ],
            ResourceKind::Visits => &[Role::Admin, Role::ClinicManager, Role::Secretary, Role::Doctor],
            ResourceKind::Examinations => &[Role::Admin, Role::Doctor, Role::Optician],
            ResourceKind::Sales => &[Role::Admin, Role::ClinicManager, Role::Optician],
            ResourceKind::Products => &[Role::Admin, Role::ClinicManager, Role::Optician],
            ResourceKind::Users => &[Role::Admin, Role::ClinicManager, Role::SuperAdmin],
            ResourceKind::Clinics => &[Role::Admin, Role::SuperAdmin],
        }
    }

    /// Page route of this screen inside `role`'s area
    pub fn page_route(&self, role: Role) -> Option<String> {
        self.areas()
            .contains(&role)
            .then(|| format!("{}/{}", role.home_route(), self.segment()))
    }

    /// Screens available in `role`'s area
    pub fn for_role(role: Role) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| kind.areas().contains(&role))
            .collect()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// A record type served under one REST collection
pub trait Resource: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Body sent on create and update
    type Draft: Validate + Serialize + DeserializeOwned + Send + Sync;

    const KIND: ResourceKind;

    /// Whether lists default to the session's selected clinic
    const CLINIC_SCOPED: bool = true;

    fn id(&self) -> &str;

    fn headers() -> &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

/// Filters for a list fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    /// Explicit clinic scope; falls back to the session's selected clinic
    pub clinic_id: Option<String>,
    pub role: Option<Role>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = (!text.trim().is_empty()).then(|| text.trim().to_string());
        self
    }

    pub fn clinic(mut self, clinic_id: impl Into<String>) -> Self {
        self.clinic_id = Some(clinic_id.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Typed CRUD client for one resource
pub struct ResourceApi<R> {
    api: ApiClient,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }

    fn item_path(&self, id: &str) -> Result<String> {
        self.api.item_path(&R::KIND.endpoint(), id)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>> {
        let clinic_id = if R::CLINIC_SCOPED {
            query
                .clinic_id
                .clone()
                .or_else(|| self.api.session().clinic_id())
        } else {
            query.clinic_id.clone()
        };

        self.api
            .get_query(
                &R::KIND.endpoint(),
                &[
                    ("search", query.search.clone()),
                    ("clinicId", clinic_id),
                    ("role", query.role.map(|r| r.to_string())),
                ],
            )
            .await
    }

    pub async fn get(&self, id: &str) -> Result<R> {
        self.api.get(&self.item_path(id)?).await
    }

    /// Validate locally, then create
    pub async fn create(&self, draft: &R::Draft) -> Result<R> {
        draft.validate()?;
        self.api.post(&R::KIND.endpoint(), draft).await
    }

    /// Validate locally, then replace
    pub async fn update(&self, id: &str, draft: &R::Draft) -> Result<R> {
        draft.validate()?;
        self.api.put(&self.item_path(id)?, draft).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete(&self.item_path(id)?).await
    }
}

/// Render an optional cell
pub(crate) fn cell(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

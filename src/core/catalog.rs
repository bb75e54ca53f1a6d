use crate::domain::model::{Category, Service};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub injectables: Vec<Service>,
    pub prp: Vec<Service>,
    pub peels: Vec<Service>,
}

/// Optional per-variant replacement sections from `[catalog]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogOverrides {
    pub injectables: Option<Vec<Service>>,
    pub prp: Option<Vec<Service>>,
    pub peels: Option<Vec<Service>>,
}

fn service(name: &str, price: &str, duration: &str, details: &str) -> Service {
    Service {
        name: name.to_string(),
        price: price.to_string(),
        duration: duration.to_string(),
        details: details.to_string(),
        variation_id: None,
    }
}

impl Catalog {
    pub fn glow_atelier() -> Self {
        let injectables = vec![
            service("Botox with Farah", "$9/unit", "15 min", "Precise wrinkle relaxation"),
            service("Botox with Malak", "$9/unit", "30 min", "Express appointment"),
            service("Botox touch up", "Complimentary", "10 min", "2-week follow up with Farah or Malak"),
            service("Lip filler", "$400", "45 min", "Full, balanced volume"),
            service("Lip filler touch up", "Existing clients", "10 min", "Maintenance visit"),
            service("Lip Flip", "$60+", "15 min", "Botox lip definition"),
            service("Cheek filler", "$400+", "45 min", "Midface contour"),
            service("Jaw filler", "$400+", "60 min", "Snatched jawline"),
            service("Nose filler", "$400+", "30 min", "Non-surgical contour"),
            service("Nasolabial folds", "$400+", "45 min", "Laugh line softening"),
            service("Temple filler", "$400", "30 min", "Temple balance"),
            service("SkinVive", "Custom", "30 min", "Juvederm glow"),
            service("Kybella", "Consult", "60 min", "Targeted fat reduction"),
            service("Sculptra", "$550+", "60 min", "Collagen biostimulator"),
            service("Kenalog injections", "Consult", "15 min", "Inflammation control"),
        ];

        let prp = vec![
            service("Vampire Facial (PRP)", "$250/session", "60 min", "Collagen-rich microneedling"),
            service("PRP under eyes", "$150/session", "45 min", "Brighten + thicken skin"),
            service("PRP hair restoration", "$250/session", "60 min", "Series-based protocol"),
            service("PRP restoration plan", "Treatment schedule", "Multi-visit", "6-week cadence packages"),
        ];

        let peels = vec![
            service("Perfect Derma Peel", "$175", "45 min", "Medium-depth resurfacing"),
            service("Vampire Facial add-on", "$250/session", "60 min", "PRP-infused exfoliation"),
        ];

        Self {
            injectables,
            prp,
            peels,
        }
    }

    /// 以設定檔覆蓋對應區塊，沒指定的區塊保留預設內容
    pub fn with_overrides(mut self, overrides: &CatalogOverrides) -> Self {
        if let Some(injectables) = &overrides.injectables {
            self.injectables = injectables.clone();
        }
        if let Some(prp) = &overrides.prp {
            self.prp = prp.clone();
        }
        if let Some(peels) = &overrides.peels {
            self.peels = peels.clone();
        }
        self
    }

    pub fn sections(&self) -> [(Category, &[Service]); 3] {
        [
            (Category::Injectables, self.injectables.as_slice()),
            (Category::Prp, self.prp.as_slice()),
            (Category::Peels, self.peels.as_slice()),
        ]
    }

    pub fn find(&self, name: &str) -> Option<&Service> {
        let wanted = name.trim();
        self.sections()
            .into_iter()
            .flat_map(|(_, services)| services.iter())
            .find(|s| s.name.eq_ignore_ascii_case(wanted))
    }

    pub fn len(&self) -> usize {
        self.injectables.len() + self.prp.len() + self.peels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::glow_atelier()
    }
}

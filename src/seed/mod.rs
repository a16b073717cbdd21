//! Demo data. Seeds the catalog and a couple of returns through the store
//! traits, so the same code populates either backend.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::AppResult;
use crate::models::{
    CreateCategory, CreateMaterial, CreateUnit, InspectItem, InspectReturn, InspectionResult,
    PhysicalCondition, RegisterReturn, RegisterReturnItem, ReorderConfig,
};
use crate::store::{Catalog, RecordStore};

static CATEGORIES: &[&str] = &[
    "Smartphones",
    "Tablets",
    "Accesorios Móviles",
    "Módems y Routers",
    "SIM Cards",
    "Equipos de Red",
    "Cables y Conectores",
];

/// (code, name, category) triples from the demo catalog.
static MATERIALS: &[(&str, &str, &str)] = &[
    ("CEL-SAM-S24-256-BLK", "Samsung Galaxy S24 256GB Negro", "Smartphones"),
    ("CEL-SAM-S24-256-GRY", "Samsung Galaxy S24 256GB Gris", "Smartphones"),
    ("CEL-IPH-15-128-BLK", "iPhone 15 128GB Negro", "Smartphones"),
    ("CEL-IPH-15-256-BLU", "iPhone 15 256GB Azul", "Smartphones"),
    ("CEL-XIA-RED13-128", "Xiaomi Redmi Note 13 128GB", "Smartphones"),
    ("TAB-SAM-S9-128-GRY", "Samsung Galaxy Tab S9 128GB", "Tablets"),
    ("TAB-IPD-AIR-256", "iPad Air 256GB", "Tablets"),
    ("ACC-CARG-USB-C-20W", "Cargador USB-C 20W", "Accesorios Móviles"),
    ("ACC-CABLE-USC-1M", "Cable USB-C 1 metro", "Accesorios Móviles"),
    ("NET-ROUT-WIFI6-AX3000", "Router WiFi 6 AX3000", "Módems y Routers"),
    ("NET-MOD-4G-LTE", "Módem 4G LTE Portátil", "Módems y Routers"),
    ("SIM-PREPAGO-STD", "SIM Card Prepago Estándar", "SIM Cards"),
    ("SIM-POSTPAGO-STD", "SIM Card Postpago Estándar", "SIM Cards"),
    ("RED-SW-8P-GIG", "Switch 8 Puertos Gigabit", "Equipos de Red"),
    ("RED-AP-WIFI6-IN", "Access Point WiFi 6 Indoor", "Equipos de Red"),
    ("CAB-ETH-CAT6-1M", "Cable Ethernet Cat6 1m", "Cables y Conectores"),
    ("CAB-FIB-OPT-10M", "Cable Fibra Óptica 10m", "Cables y Conectores"),
];

static RETURN_REASONS: &[&str] = &[
    "Equipo defectuoso de fábrica",
    "Pantalla con píxeles muertos",
    "No enciende",
    "Cliente cambió de plan",
    "Empaque dañado en transporte",
];

/// Populates categories, units, materials and two demo returns (one of them
/// already inspected into repair). Returns the number of materials created.
pub async fn seed_demo_data(
    catalog: &dyn Catalog,
    records: &dyn RecordStore,
) -> AppResult<usize> {
    let mut rng = StdRng::from_entropy();

    let unit = catalog
        .create_unit(CreateUnit {
            name: "Unidad".to_string(),
            symbol: "und".to_string(),
        })
        .await?;
    catalog
        .create_unit(CreateUnit {
            name: "Metro".to_string(),
            symbol: "m".to_string(),
        })
        .await?;
    catalog
        .create_unit(CreateUnit {
            name: "Caja".to_string(),
            symbol: "caja".to_string(),
        })
        .await?;

    let mut category_ids = std::collections::HashMap::new();
    for name in CATEGORIES {
        let category = catalog
            .create_category(CreateCategory {
                name: name.to_string(),
                description: None,
            })
            .await?;
        category_ids.insert(*name, category.id);
    }

    let mut material_ids = Vec::with_capacity(MATERIALS.len());
    for (i, (code, name, category)) in MATERIALS.iter().enumerate() {
        let stock = rng.gen_range(0..=80);
        // A couple of materials start below their thresholds so the reorder
        // sweep has something to report out of the box.
        let reorder_config = if i % 3 == 0 {
            Some(ReorderConfig {
                minimum_stock: 3,
                reorder_point: 10,
                alert_enabled: true,
            })
        } else {
            None
        };
        let material = catalog
            .create_material(CreateMaterial {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                category_id: category_ids[category],
                base_unit_id: unit.id,
                active: true,
                stock_available: if i == 0 { 2 } else { stock },
                stock_committed: rng.gen_range(0..=10),
                reorder_config,
            })
            .await?;
        material_ids.push(material.id);
    }

    // One untouched return and one inspected into repair.
    records
        .register_return(RegisterReturn {
            customer_name: Some("Carlos Ramírez".to_string()),
            customer_document: Some("CC 1032456789".to_string()),
            general_reason: RETURN_REASONS[0].to_string(),
            notes: None,
            user: None,
            items: vec![
                RegisterReturnItem {
                    material_id: material_ids[0],
                    quantity: 1,
                    reason: RETURN_REASONS[2].to_string(),
                    notes: None,
                },
                RegisterReturnItem {
                    material_id: material_ids[7],
                    quantity: 2,
                    reason: RETURN_REASONS[4].to_string(),
                    notes: None,
                },
            ],
        })
        .await?;

    let in_repair = records
        .register_return(RegisterReturn {
            customer_name: Some("Lucía Fernández".to_string()),
            customer_document: Some("CC 52987654".to_string()),
            general_reason: RETURN_REASONS[1].to_string(),
            notes: Some("Cliente solicita reparación".to_string()),
            user: None,
            items: vec![RegisterReturnItem {
                material_id: material_ids[2],
                quantity: 1,
                reason: RETURN_REASONS[1].to_string(),
                notes: None,
            }],
        })
        .await?;
    records
        .inspect(
            in_repair.id,
            InspectReturn {
                inspector: Some("mtorres".to_string()),
                notes: Some("Pantalla reemplazable".to_string()),
                items: vec![InspectItem {
                    item_id: in_repair.items[0].id,
                    condition: Some(PhysicalCondition::Damaged),
                    result: Some(InspectionResult::Repairable),
                }],
            },
        )
        .await?;

    info!(
        materials = material_ids.len(),
        returns = 2,
        "Seeded demo data"
    );
    Ok(material_ids.len())
}

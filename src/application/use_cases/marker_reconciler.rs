//! Marker reconciliation
//!
//! Every cycle is a full replacement: the previous marker set is discarded
//! from the surface and one fresh marker is built per rendered record.
//! Repeating a cycle with the same input therefore yields the same keys and
//! never accumulates duplicates.

use std::collections::HashMap;

use crate::domain::health::{
    Category, ClassifiedRecord, HealthRecord, LatLng, Marker, MarkerSet, Viewport,
};

/// Rendering surface seam (a map widget, or a snapshot served over HTTP)
pub trait MarkerSurface {
    /// Remove every marker of `previous` from the surface
    fn clear(&mut self, previous: &MarkerSet);
    fn add(&mut self, marker: &Marker);
    fn fit(&mut self, viewport: Viewport);
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub markers: MarkerSet,
    pub viewport: Option<Viewport>,
    /// Markers discarded from the previous cycle
    pub removed: usize,
}

/// Identity of a record's marker: its id, else coordinates plus category
pub fn marker_key(record: &HealthRecord, category: Category) -> String {
    match &record.id {
        Some(id) => id.clone(),
        None => format!("{:.6},{:.6}:{}", record.latitude, record.longitude, category),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn popup_line(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>", label, escape_html(value))
}

/// Popup HTML for a rendered record
pub fn popup_content(record: &HealthRecord, category: Category) -> String {
    let color = category.color().unwrap_or("#6b7280");
    let mut lines = Vec::new();

    match category {
        Category::Pregnant => {
            lines.push(format!(
                "<h3 style=\"color: {}\">{} {}</h3>",
                color,
                category.icon(),
                category.label()
            ));
            lines.push(popup_line("ชื่อ", record.mother_name.display()));
            lines.push(popup_line("สามี", record.father_name.display()));
            lines.push(popup_line(
                "อายุครรภ์",
                &format!("{} สัปดาห์", record.gestational_weeks),
            ));
            if let Some(date) = record.expected_date.value() {
                lines.push(popup_line("กำหนดคลอด", date));
            }
        }
        _ => {
            lines.push(format!(
                "<h3 style=\"color: {}\">{} {}</h3>",
                color,
                category.icon(),
                escape_html(record.baby_name.display())
            ));
            let weight = if record.weight_grams > 0.0 {
                format!("{} กรัม", record.weight_grams)
            } else {
                record.raw_type.display().to_string()
            };
            lines.push(popup_line("น้ำหนักแรกเกิด", &weight));
            lines.push(popup_line("สถานะ", category.label()));
            lines.push(popup_line("ชื่อพ่อ", record.father_name.display()));
            lines.push(popup_line("ชื่อแม่", record.mother_name.display()));
            if let Some(date) = record.birth_date.value() {
                lines.push(popup_line("วันเกิด", date));
            }
        }
    }

    lines.push(popup_line("ที่อยู่", record.address.display()));

    format!("<div class=\"popup\">{}</div>", lines.join(""))
}

fn build_marker(classified: &ClassifiedRecord, color: &'static str, key: String) -> Marker {
    let record = &classified.record;
    Marker {
        key,
        position: LatLng {
            lat: record.latitude,
            lng: record.longitude,
        },
        category: classified.category,
        color,
        icon: classified.category.icon(),
        popup_content: popup_content(record, classified.category),
    }
}

/// Markers and viewport for `classified`, independent of `previous`
/// (which is only discarded). Unknown records are not rendered. Records
/// sharing a key get `#2`, `#3`, ... in dataset order.
pub fn reconcile(
    previous: &MarkerSet,
    classified: &[ClassifiedRecord],
    viewport_padding: f64,
) -> Reconciliation {
    let mut markers = MarkerSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for item in classified {
        let Some(color) = item.category.color() else {
            continue;
        };

        let base = marker_key(&item.record, item.category);
        let occurrence = seen.entry(base.clone()).or_insert(0);
        *occurrence += 1;
        let mut key = if *occurrence == 1 {
            base.clone()
        } else {
            format!("{}#{}", base, occurrence)
        };
        // An id may itself look like a suffixed key ("x#2").
        while markers.contains_key(&key) {
            *occurrence += 1;
            key = format!("{}#{}", base, occurrence);
        }

        let inserted = markers.insert(build_marker(item, color, key));
        debug_assert!(inserted, "marker key still taken after suffixing");
    }

    let viewport = Viewport::around(markers.iter().map(|m| &m.position), viewport_padding);

    Reconciliation {
        markers,
        viewport,
        removed: previous.len(),
    }
}

/// Exclusive owner of the marker set currently on a surface
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    current: MarkerSet,
    viewport_padding: f64,
}

impl MarkerReconciler {
    pub fn new(viewport_padding: f64) -> Self {
        Self {
            current: MarkerSet::new(),
            viewport_padding,
        }
    }

    pub fn current(&self) -> &MarkerSet {
        &self.current
    }

    /// Replace everything on `surface` with markers for `classified`
    pub fn apply(
        &mut self,
        surface: &mut dyn MarkerSurface,
        classified: &[ClassifiedRecord],
    ) -> Reconciliation {
        let reconciliation = reconcile(&self.current, classified, self.viewport_padding);

        surface.clear(&self.current);
        for marker in reconciliation.markers.iter() {
            surface.add(marker);
        }
        if let Some(viewport) = reconciliation.viewport {
            surface.fit(viewport);
        }

        self.current = reconciliation.markers.clone();
        reconciliation
    }
}

/// In-process surface holding what the browser map should show
#[derive(Debug, Clone, Default)]
pub struct SnapshotSurface {
    markers: Vec<Marker>,
    viewport: Option<Viewport>,
}

impl SnapshotSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

impl MarkerSurface for SnapshotSurface {
    fn clear(&mut self, previous: &MarkerSet) {
        self.markers.retain(|marker| !previous.contains_key(&marker.key));
        self.viewport = None;
    }

    fn add(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn fit(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::Text;

    fn classified(id: Option<&str>, lat: f64, lng: f64, category: Category) -> ClassifiedRecord {
        ClassifiedRecord {
            record: HealthRecord {
                id: id.map(str::to_string),
                mother_name: Text::new("<b>แม่</b>"),
                father_name: Text::unspecified(),
                baby_name: Text::unspecified(),
                address: Text::unspecified(),
                weight_grams: 3200.0,
                gestational_weeks: 0.0,
                latitude: lat,
                longitude: lng,
                raw_type: Text::unspecified(),
                birth_date: Text::unspecified(),
                expected_date: Text::unspecified(),
            },
            category,
        }
    }

    fn dataset() -> Vec<ClassifiedRecord> {
        vec![
            classified(None, 13.7563, 100.5018, Category::Pregnant),
            classified(Some("b-2"), 14.98, 102.10, Category::LowWeight),
            classified(None, 18.79, 98.99, Category::NormalWeight),
            classified(None, 15.0, 101.0, Category::Unknown),
        ]
    }

    #[test]
    fn test_unknown_records_are_not_rendered() {
        let result = reconcile(&MarkerSet::new(), &dataset(), 0.1);
        assert_eq!(result.markers.len(), 3);
        assert!(result.markers.iter().all(|m| m.category != Category::Unknown));
    }

    #[test]
    fn test_keys_use_id_or_coordinates() {
        let result = reconcile(&MarkerSet::new(), &dataset(), 0.1);
        let keys = result.markers.keys();
        assert!(keys.contains("b-2"));
        assert!(keys.contains("13.756300,100.501800:pregnant"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let data = dataset();
        let once = reconcile(&MarkerSet::new(), &data, 0.1);
        let twice = reconcile(&once.markers, &data, 0.1);

        assert_eq!(once.markers.keys(), twice.markers.keys());
        assert_eq!(twice.markers.len(), 3);
        assert_eq!(twice.removed, 3);
    }

    #[test]
    fn test_duplicate_keys_get_suffixes() {
        let data = vec![
            classified(None, 18.79, 98.99, Category::NormalWeight),
            classified(None, 18.79, 98.99, Category::NormalWeight),
        ];
        let result = reconcile(&MarkerSet::new(), &data, 0.1);
        let keys = result.markers.keys();

        assert_eq!(result.markers.len(), 2);
        assert!(keys.contains("18.790000,98.990000:normalWeight"));
        assert!(keys.contains("18.790000,98.990000:normalWeight#2"));
    }

    #[test]
    fn test_suffixed_ids_do_not_swallow_records() {
        let data = vec![
            classified(Some("x"), 18.79, 98.99, Category::NormalWeight),
            classified(Some("x"), 18.80, 98.98, Category::NormalWeight),
            classified(Some("x#2"), 18.81, 98.97, Category::NormalWeight),
        ];
        let result = reconcile(&MarkerSet::new(), &data, 0.1);
        let keys = result.markers.keys();

        assert_eq!(result.markers.len(), data.len());
        assert!(keys.contains("x"));
        assert!(keys.contains("x#2"));
        assert!(keys.contains("x#2#2"));

        let again = reconcile(&result.markers, &data, 0.1);
        assert_eq!(again.markers.keys(), keys);
    }

    #[test]
    fn test_viewport_covers_markers() {
        let result = reconcile(&MarkerSet::new(), &dataset(), 0.1);
        let viewport = result.viewport.unwrap();
        assert!(result.markers.iter().all(|m| viewport.contains(&m.position)));

        let empty = reconcile(&MarkerSet::new(), &[], 0.1);
        assert!(empty.viewport.is_none());
    }

    #[test]
    fn test_apply_replaces_surface_contents() {
        let mut reconciler = MarkerReconciler::new(0.1);
        let mut surface = SnapshotSurface::new();
        let data = dataset();

        reconciler.apply(&mut surface, &data);
        reconciler.apply(&mut surface, &data);
        assert_eq!(surface.markers().len(), 3);
        assert!(surface.viewport().is_some());

        reconciler.apply(&mut surface, &data[..1]);
        assert_eq!(surface.markers().len(), 1);
        assert_eq!(reconciler.current().len(), 1);

        reconciler.apply(&mut surface, &[]);
        assert!(surface.markers().is_empty());
        assert!(surface.viewport().is_none());
    }

    #[test]
    fn test_popup_escapes_record_text() {
        let item = classified(None, 13.0, 100.0, Category::Pregnant);
        let html = popup_content(&item.record, item.category);
        assert!(html.contains("&lt;b&gt;แม่&lt;/b&gt;"));
        assert!(!html.contains("<b>แม่"));
    }
}

use anyhow::bail;

/// The four scored skill areas of the certification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discipline {
    Care,
    OneColor,
    Gradation,
    Time,
}

pub const CARE_MAX: f64 = 410.0;
pub const ONE_COLOR_MAX: f64 = 610.0;
/// Gradation is reported on a 0-100 scale; this is the raw normalization base.
pub const GRADATION_RAW_MAX: f64 = 170.0;
pub const TIME_MAX: f64 = 300.0;
/// care + one color + time. Gradation carries its own normalized scale and
/// does not enter the overall total.
pub const OVERALL_MAX: f64 = 1320.0;

impl Discipline {
    pub const ALL: [Discipline; 4] = [
        Discipline::Care,
        Discipline::OneColor,
        Discipline::Gradation,
        Discipline::Time,
    ];

    pub fn items(self) -> &'static [ItemDef] {
        match self {
            Discipline::Care => CARE_ITEMS,
            Discipline::OneColor => ONE_COLOR_ITEMS,
            Discipline::Gradation => GRADATION_ITEMS,
            Discipline::Time => TIME_ITEMS,
        }
    }

    /// Maximum of the scale the discipline total is reported on.
    pub fn max_score(self) -> f64 {
        match self {
            Discipline::Care => CARE_MAX,
            Discipline::OneColor => ONE_COLOR_MAX,
            Discipline::Gradation => 100.0,
            Discipline::Time => TIME_MAX,
        }
    }

    /// Sum every item allocation must reach; the configuration invariant
    /// checked by `validate`.
    pub fn allocation_max(self) -> f64 {
        match self {
            Discipline::Care => CARE_MAX,
            Discipline::OneColor => ONE_COLOR_MAX,
            Discipline::Gradation => GRADATION_RAW_MAX,
            Discipline::Time => TIME_MAX,
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            Discipline::Care => "care",
            Discipline::OneColor => "color",
            Discipline::Gradation => "grad",
            Discipline::Time => "time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Discipline::Care => "care",
            Discipline::OneColor => "one color",
            Discipline::Gradation => "gradation",
            Discipline::Time => "time",
        }
    }

    /// Inclusive category-number range owned by the discipline.
    pub fn category_range(self) -> (u32, u32) {
        match self {
            Discipline::Care => (1, 13),
            Discipline::OneColor => (14, 27),
            Discipline::Gradation => (28, 32),
            Discipline::Time => (33, 37),
        }
    }
}

/// Static descriptor for one scored checkpoint. Tables are fixed at compile
/// time; nothing creates or mutates these at runtime.
#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub id: &'static str,
    pub key: &'static str,
    pub category: u32,
    pub label: &'static str,
    pub allocation: u32,
    pub required: bool,
    /// Target duration in minutes; set on time items only.
    pub target_minutes: Option<f64>,
}

const fn item(
    id: &'static str,
    key: &'static str,
    category: u32,
    label: &'static str,
    allocation: u32,
) -> ItemDef {
    ItemDef {
        id,
        key,
        category,
        label,
        allocation,
        required: false,
        target_minutes: None,
    }
}

const fn required(
    id: &'static str,
    key: &'static str,
    category: u32,
    label: &'static str,
    allocation: u32,
) -> ItemDef {
    ItemDef {
        id,
        key,
        category,
        label,
        allocation,
        required: true,
        target_minutes: None,
    }
}

const fn timed(
    id: &'static str,
    key: &'static str,
    category: u32,
    label: &'static str,
    allocation: u32,
    target_minutes: f64,
) -> ItemDef {
    ItemDef {
        id,
        key,
        category,
        label,
        allocation,
        required: false,
        target_minutes: Some(target_minutes),
    }
}

/// Hand-care checkpoints. Categories 1-3 cover filing, 4-6 shape,
/// 7-13 cuticle work. Allocations sum to 410.
pub const CARE_ITEMS: &[ItemDef] = &[
    item("1-1", "care_1_1", 1, "over-filed", 10),
    item("1-2", "care_1_2", 1, "under-cut", 20),
    item("2-1", "care_2_1", 2, "gel residue", 20),
    item("3-1", "care_3_1", 3, "root step", 10),
    item("3-2", "care_3_2", 3, "surface unevenness", 10),
    item("3-3", "care_3_3", 3, "side filing", 20),
    item("3-4", "care_3_4", 3, "thickness", 10),
    required("4-1", "care_4_1", 4, "ragged edge", 20),
    item("4-2", "care_4_2", 4, "balance", 20),
    required("4-3", "care_4_3", 4, "uniform shape", 30),
    item("5-1", "care_5_1", 5, "side drop", 10),
    item("5-2", "care_5_2", 5, "side rise", 20),
    item("5-3", "care_5_3", 5, "corner left over", 20),
    item("6-1", "care_6_1", 6, "center line", 10),
    item("6-2", "care_6_2", 6, "left-right symmetry", 20),
    item("7-1", "care_7_1", 7, "loose cuticle, right corner", 20),
    item("8-1", "care_8_1", 8, "loose cuticle, left corner", 20),
    required("9-1", "care_9_1", 9, "loose cuticle, right side", 20),
    required("10-1", "care_10_1", 10, "loose cuticle, left side", 20),
    item("11-1", "care_11_1", 11, "small nail", 10),
    item("11-2", "care_11_2", 11, "hard skin", 10),
    required("12-1", "care_12_1", 12, "loose cuticle line", 20),
    item("12-2", "care_12_2", 12, "ragged cuticle line", 10),
    item("13-1", "care_13_1", 13, "nipper ragged edge", 10),
    item("13-2", "care_13_2", 13, "nipper over-cut", 10),
    item("13-3", "care_13_3", 13, "hangnail", 10),
];

/// One-color application checkpoints. Categories 14-19 cover the base coat,
/// 20-25 the color coats, 26-27 the top coat. Allocations sum to 610.
pub const ONE_COLOR_ITEMS: &[ItemDef] = &[
    item("14-1", "color_14_1", 14, "base cuticle line", 10),
    required("14-2", "color_14_2", 14, "base corner side", 20),
    item("14-3", "color_14_3", 14, "top coat cuticle line", 20),
    item("14-4", "color_14_4", 14, "top coat corner side", 10),
    item("15-1", "color_15_1", 15, "gap or missed coverage", 20),
    item("15-2", "color_15_2", 15, "ragged line", 10),
    item("16-1", "color_16_1", 16, "gap or missed coverage", 10),
    item("16-2", "color_16_2", 16, "ragged line", 20),
    item("17-1", "color_17_1", 17, "gap or missed coverage", 10),
    required("17-2", "color_17_2", 17, "ragged line", 20),
    item("18-1", "color_18_1", 18, "high point position", 20),
    required("18-2", "color_18_2", 18, "arch unevenness", 30),
    item("19-1", "color_19_1", 19, "cuticle area", 10),
    item("19-2", "color_19_2", 19, "corner", 20),
    item("19-3", "color_19_3", 19, "yellow line", 20),
    item("19-4", "color_19_4", 19, "tip", 20),
    item("19-5", "color_19_5", 19, "side", 20),
    item("19-6", "color_19_6", 19, "side straight", 20),
    item("20-1", "color_20_1", 20, "gap or missed coverage", 20),
    required("20-2", "color_20_2", 20, "ragged line", 30),
    item("21-1", "color_21_1", 21, "gap or missed coverage", 30),
    item("21-2", "color_21_2", 21, "ragged line", 10),
    item("22-1", "color_22_1", 22, "gap or missed coverage", 10),
    item("22-2", "color_22_2", 22, "ragged line", 20),
    item("23-1", "color_23_1", 23, "gap or missed coverage", 20),
    required("23-2", "color_23_2", 23, "ragged line", 20),
    item("24-1", "color_24_1", 24, "gap or missed coverage", 20),
    item("24-2", "color_24_2", 24, "ragged line", 10),
    item("25-1", "color_25_1", 25, "missed edge coverage", 10),
    item("25-2", "color_25_2", 25, "ragged edge line", 10),
    item("25-3", "color_25_3", 25, "back flow", 20),
    item("26-1", "color_26_1", 26, "high point position", 10),
    required("26-2", "color_26_2", 26, "arch unevenness", 20),
    item("27-1", "color_27_1", 27, "cuticle area", 10),
    item("27-2", "color_27_2", 27, "corner", 10),
    item("27-3", "color_27_3", 27, "tip seal", 20),
];

/// Gradient application checkpoints. Every item is worth 10 raw points;
/// the discipline total is normalized against the 170-point base.
pub const GRADATION_ITEMS: &[ItemDef] = &[
    item("28-1", "grad_28_1", 28, "vertical streaks", 10),
    item("28-2", "grad_28_2", 28, "brush marks", 10),
    item("28-3", "grad_28_3", 28, "left-right difference", 10),
    item("28-4", "grad_28_4", 28, "color pooling", 10),
    item("29-1", "grad_29_1", 29, "mid-nail translucence", 10),
    item("29-2", "grad_29_2", 29, "tip color density", 10),
    item("30-1", "grad_30_1", 30, "overflow", 10),
    item("30-2", "grad_30_2", 30, "missed coverage", 10),
    item("30-3", "grad_30_3", 30, "ragged line", 10),
    item("31-1", "grad_31_1", 31, "high point position", 10),
    item("31-2", "grad_31_2", 31, "arch unevenness", 10),
    item("32-1", "grad_32_1", 32, "cuticle area", 10),
    item("32-2", "grad_32_2", 32, "corner", 10),
    item("32-3", "grad_32_3", 32, "yellow line", 10),
    item("32-4", "grad_32_4", 32, "tip", 10),
    item("32-5", "grad_32_5", 32, "side", 10),
    item("32-6", "grad_32_6", 32, "side straight", 10),
];

/// Timed phases. Raw values are duration strings; targets come from the
/// reference timetable. Allocations sum to 300.
pub const TIME_ITEMS: &[ItemDef] = &[
    timed("33", "time_33", 33, "care time (10 nails)", 30, 20.0),
    timed("34", "time_34", 34, "off time (5 nails)", 30, 13.0),
    timed("35", "time_35", 35, "fill-in time (5 nails)", 20, 8.0),
    timed("36-1", "time_36_1", 36, "one color base", 30, 6.0),
    timed("36-2", "time_36_2", 36, "one color polish", 20, 10.0),
    timed("36-3", "time_36_3", 36, "one color top", 30, 5.0),
    timed("36-4", "time_36_4", 36, "one color total (5 nails)", 30, 21.0),
    timed("37-1", "time_37_1", 37, "gradation base", 30, 6.0),
    timed("37-2", "time_37_2", 37, "gradation polish", 20, 10.0),
    timed("37-3", "time_37_3", 37, "gradation top", 30, 5.0),
    timed("37-4", "time_37_4", 37, "gradation total (5 nails)", 30, 21.0),
];

/// Every checkpoint across the four disciplines, in catalog order.
pub fn all_items() -> impl Iterator<Item = &'static ItemDef> {
    Discipline::ALL.iter().flat_map(|d| d.items())
}

/// Leading numeric component of an item id ("14-1" -> 14).
pub fn category_of(id: &str) -> u32 {
    id.split('-')
        .next()
        .and_then(|head| head.parse().ok())
        .unwrap_or(0)
}

/// Checks the configuration tables once at startup: key derivation, category
/// ownership, unique ids and keys, and allocation sums against the declared
/// maxima.
pub fn validate() -> anyhow::Result<()> {
    let mut seen_keys = std::collections::HashSet::new();

    for discipline in Discipline::ALL {
        let (start, end) = discipline.category_range();
        let mut sum = 0u32;

        for def in discipline.items() {
            let derived = format!("{}_{}", discipline.key_prefix(), def.id.replace('-', "_"));
            if def.key != derived {
                bail!(
                    "item {} key {} does not match derivation rule ({})",
                    def.id,
                    def.key,
                    derived
                );
            }
            if def.category != category_of(def.id) {
                bail!("item {} category {} disagrees with its id", def.id, def.category);
            }
            if def.category < start || def.category > end {
                bail!(
                    "item {} category {} outside {} range {}-{}",
                    def.id,
                    def.category,
                    discipline.label(),
                    start,
                    end
                );
            }
            if def.allocation == 0 {
                bail!("item {} has zero allocation", def.id);
            }
            if !seen_keys.insert(def.key) {
                bail!("duplicate item key {}", def.key);
            }
            if matches!(discipline, Discipline::Time) != def.target_minutes.is_some() {
                bail!("item {} target duration misplaced", def.id);
            }
            sum += def.allocation;
        }

        if f64::from(sum) != discipline.allocation_max() {
            bail!(
                "{} allocations sum to {}, expected {}",
                discipline.label(),
                sum,
                discipline.allocation_max()
            );
        }
    }

    Ok(())
}

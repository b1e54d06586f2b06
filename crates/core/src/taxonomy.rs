//! The shop's category tree: category → subcategory → type.
//!
//! The tree is compiled into the binary and never changes at runtime. It
//! drives the storefront filter controls and constrains the admin product
//! form. `value` is what a [`Product`](crate::Product) stores; `name` is the
//! display label.
//!
//! Subcategory and type values are only unique within their parent: `Dry`
//! exists under several wine categories and `Flavored` under several liquors.

use thiserror::Error;

/// Leaf of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductType {
    pub name: &'static str,
    pub value: &'static str,
}

/// Second level of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subcategory {
    pub name: &'static str,
    pub value: &'static str,
    pub types: &'static [ProductType],
}

/// Top level of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub value: &'static str,
    pub subcategories: &'static [Subcategory],
}

impl Category {
    /// Look up a subcategory of this category by value.
    #[must_use]
    pub fn subcategory(&self, value: &str) -> Option<&'static Subcategory> {
        self.subcategories.iter().find(|s| s.value == value)
    }
}

impl Subcategory {
    /// Look up a type of this subcategory by value.
    #[must_use]
    pub fn product_type(&self, value: &str) -> Option<&'static ProductType> {
        self.types.iter().find(|t| t.value == value)
    }

    /// Whether this subcategory declares any types.
    #[must_use]
    pub const fn has_types(&self) -> bool {
        !self.types.is_empty()
    }
}

/// A resolved `(category, subcategory, type)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyPath {
    pub category: &'static Category,
    pub subcategory: &'static Subcategory,
    pub product_type: Option<&'static ProductType>,
}

/// A triple that does not resolve in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown subcategory {subcategory} for category {category}")]
    UnknownSubcategory {
        category: String,
        subcategory: String,
    },
    #[error("unknown type {product_type} for subcategory {subcategory}")]
    UnknownType {
        subcategory: String,
        product_type: String,
    },
}

const fn t(name: &'static str, value: &'static str) -> ProductType {
    ProductType { name, value }
}

const fn sub(
    name: &'static str,
    value: &'static str,
    types: &'static [ProductType],
) -> Subcategory {
    Subcategory { name, value, types }
}

const DRY_RED: &[ProductType] = &[
    t("Cabernet Sauvignon", "Cabernet_Sauvignon"),
    t("Merlot", "Merlot"),
    t("Pinot Noir", "Pinot_Noir"),
    t("Red Blend", "Red_Blend"),
    t("Malbec", "Malbec"),
    t("Cabernet Franc", "Cabernet_Franc"),
    t("Sangiovese", "Sangiovese"),
    t("Montepulciano", "Montepulciano"),
    t("Zinfandel", "Zinfandel"),
    t("Bordeaux", "Bordeaux"),
    t("Rioja", "Rioja"),
    t("Chianti", "Chianti"),
    t("Shiraz", "Shiraz"),
    t("Chateauneuf du Pape", "Chateauneuf_du_Pape"),
    t("Garnacha", "Garnacha"),
    t("Toscana", "Toscana"),
    t("Nero d'Avola", "Nero_dAvola"),
    t("Amarone", "Amarone"),
    t("Côtes du Rhône", "Cotes_du_Rhone"),
];

const SWEET_RED: &[ProductType] = &[
    t("Red Moscato", "Red_Moscato"),
    t("Sweet Red Blend", "Sweet_Red_Blend"),
    t("Sangria", "Sangria"),
    t("Lambrusco", "Lambrusco"),
    t("Table Wine", "Table_Wine"),
    t("Chocolate Wine", "Chocolate_Wine"),
];

const SEMI_RED: &[ProductType] = &[t("Table Wine", "Table_Wine"), t("Beaujolais", "Beaujolais")];

const DRY_WHITE: &[ProductType] = &[
    t("Chardonnay", "Chardonnay"),
    t("Sauvignon Blanc", "Sauvignon_Blanc"),
    t("Pinot Grigio", "Pinot_Grigio"),
    t("Dry Riesling", "Dry_Riesling"),
    t("Vinho Verde", "Vinho_Verde"),
    t("Soave", "Soave"),
    t("White Rioja", "White_Rioja"),
    t("White Malbec", "White_Malbec"),
    t("White Bordeaux", "White_Bordeaux"),
    t("White Côtes du Rhône", "White_Cotes_du_Rhone"),
];

const SWEET_WHITE: &[ProductType] = &[
    t("Moscato", "Moscato"),
    t("White Table Wine", "White_Table_Wine"),
    t("Sweet Riesling", "Sweet_Riesling"),
];

const SEMI_WHITE: &[ProductType] = &[
    t("Riesling", "Riesling"),
    t("Gewürztraminer", "Gewurztraminer"),
];

const SPARKLING: &[ProductType] = &[t("Imported", "Imported"), t("Domestic", "Domestic")];

const VERMOUTH: &[ProductType] = &[t("Dry", "Dry"), t("Sweet", "Sweet")];

const COOKING: &[ProductType] = &[
    t("Marsala", "Marsala"),
    t("Sherry", "Sherry"),
    t("Madeira", "Madeira"),
];

const DESSERT: &[ProductType] = &[
    t("Port", "Port"),
    t("Tawny Port", "Tawny_Port"),
    t("Cream Sherry", "Cream_Sherry"),
];

const WHISKEY: &[ProductType] = &[
    t("Bourbon", "Bourbon"),
    t("Scotch", "Scotch"),
    t("Irish", "Irish"),
    t("Canadian", "Canadian"),
    t("Japanese", "Japanese"),
    t("Flavored", "Flavored"),
];

const TEQUILA: &[ProductType] = &[
    t("Blanco", "Blanco"),
    t("Reposado", "Reposado"),
    t("Añejo", "Anejo"),
    t("Extra Añejo", "Extra_Anejo"),
    t("Cristalino", "Cristalino"),
];

const VODKA: &[ProductType] = &[t("Plain", "Plain"), t("Flavored", "Flavored")];

const RUM: &[ProductType] = &[
    t("Light Rum", "Light_Rum"),
    t("Dark Rum", "Dark_Rum"),
    t("Spiced Rum", "Spiced_Rum"),
    t("Flavored Rum", "Flavored_Rum"),
];

const BRANDY: &[ProductType] = &[
    t("Cognac", "Cognac"),
    t("Plain", "Plain"),
    t("Flavored", "Flavored"),
];

const CORDIALS: &[ProductType] = &[
    t("Amaretto", "Amaretto"),
    t("Creams", "Creams"),
    t("Schnapps", "Schnapps"),
    t("General Liqeuers", "General_Liqeuers"),
];

const READY_TO_DRINK: &[ProductType] = &[
    t("Canned Cocktails", "Canned_Cocktails"),
    t("Bottled Cocktails", "Bottled_Cocktails"),
];

const NONE: &[ProductType] = &[];

static CATEGORIES: &[Category] = &[
    Category {
        name: "Red Wines",
        value: "Red_Wine",
        subcategories: &[
            sub("Dry", "Dry", DRY_RED),
            sub("Sweet", "Sweet", SWEET_RED),
            sub("Semi Sweet", "Semi_Sweet", SEMI_RED),
        ],
    },
    Category {
        name: "White Wines",
        value: "White_Wine",
        subcategories: &[
            sub("Dry", "Dry", DRY_WHITE),
            sub("Sweet", "Sweet", SWEET_WHITE),
            sub("Semi Sweet", "Semi_Sweet", SEMI_WHITE),
        ],
    },
    Category {
        name: "Sparkling Wines",
        value: "Sparkling_Wine",
        subcategories: &[
            sub("Dry", "Dry", SPARKLING),
            sub("Sweet", "Sweet", SPARKLING),
        ],
    },
    Category {
        name: "Rose Wines",
        value: "Rose_Wine",
        subcategories: &[sub("Dry", "Dry", NONE), sub("Sweet", "Sweet", NONE)],
    },
    Category {
        name: "Other Wines",
        value: "Other_Wine",
        subcategories: &[
            sub("Dessert", "Dessert", DESSERT),
            sub("Cooking", "Cooking", COOKING),
            sub("Vermouth", "Vermouth", VERMOUTH),
            sub("Box Wine", "Box_Wine", NONE),
            sub("Organic", "Organic", NONE),
            sub("Low Calorie", "Low_Calorie", NONE),
        ],
    },
    Category {
        name: "Liquor",
        value: "Liquor",
        subcategories: &[
            sub("Whiskey", "Whiskey", WHISKEY),
            sub("Tequila", "Tequila", TEQUILA),
            sub("Vodka", "Vodka", VODKA),
            sub("Gin", "Gin", NONE),
            sub("Rum", "Rum", RUM),
            sub("Brandy", "Brandy", BRANDY),
            sub(
                "Cordials/Liqueurs/Schnapps",
                "Cordials_Liqueurs_Schnapps",
                CORDIALS,
            ),
            sub("Ready-To-Drink", "Ready_To_Drink", READY_TO_DRINK),
            sub("Moonshine", "Moonshine", NONE),
        ],
    },
];

/// All top-level categories, in display order.
#[must_use]
pub fn categories() -> &'static [Category] {
    CATEGORIES
}

/// Look up a category by value.
#[must_use]
pub fn category(value: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.value == value)
}

/// Resolve a stored triple against the tree.
///
/// An empty `product_type` is always accepted; types are optional.
///
/// # Errors
///
/// Returns the first level of the triple that does not exist.
pub fn resolve(
    category_value: &str,
    subcategory_value: &str,
    product_type: &str,
) -> Result<TaxonomyPath, TaxonomyError> {
    let category = category(category_value)
        .ok_or_else(|| TaxonomyError::UnknownCategory(category_value.to_string()))?;

    let subcategory = category.subcategory(subcategory_value).ok_or_else(|| {
        TaxonomyError::UnknownSubcategory {
            category: category_value.to_string(),
            subcategory: subcategory_value.to_string(),
        }
    })?;

    let product_type = if product_type.is_empty() {
        None
    } else {
        Some(
            subcategory
                .product_type(product_type)
                .ok_or_else(|| TaxonomyError::UnknownType {
                    subcategory: subcategory_value.to_string(),
                    product_type: product_type.to_string(),
                })?,
        )
    };

    Ok(TaxonomyPath {
        category,
        subcategory,
        product_type,
    })
}

/// Distinct subcategories across all categories, first occurrence wins.
///
/// Used for filter controls that are not scoped to one category.
#[must_use]
pub fn subcategory_values() -> Vec<&'static Subcategory> {
    let mut seen: Vec<&'static Subcategory> = Vec::new();
    for subcategory in CATEGORIES.iter().flat_map(|c| c.subcategories.iter()) {
        if !seen.iter().any(|s| s.value == subcategory.value) {
            seen.push(subcategory);
        }
    }
    seen
}

/// Display label for a category value, falling back to the raw value.
#[must_use]
pub fn category_label(value: &str) -> &str {
    category(value).map_or(value, |c| c.name)
}

/// Display label for a subcategory value, falling back to the raw value.
#[must_use]
pub fn subcategory_label<'a>(category_value: &str, value: &'a str) -> &'a str {
    category(category_value)
        .and_then(|c| c.subcategory(value))
        .map_or(value, |s| s.name)
}

/// Display label for a type value, falling back to the raw value.
#[must_use]
pub fn type_label<'a>(category_value: &str, subcategory_value: &str, value: &'a str) -> &'a str {
    category(category_value)
        .and_then(|c| c.subcategory(subcategory_value))
        .and_then(|s| s.product_type(value))
        .map_or(value, |t| t.name)
}

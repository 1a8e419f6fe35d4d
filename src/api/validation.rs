//! Request validation. Each validator checks a raw request struct, collects
//! every problem into a field map, and only then builds the domain input.

use regex::Regex;
use std::sync::OnceLock;

use super::error::FieldErrors;
use super::types::{
    BulkStockRequest, ChangePasswordRequest, CompatibilityRequest, ConfirmResetRequest,
    CreateProductRequest, LoginRequest, MetalRequest, PageParams, ProductListParams,
    RegisterRequest, ResetPasswordRequest, UpdateProductRequest, UpdateUserRequest,
    UserListParams,
};
use super::ApiError;
use crate::constants::compatibility::MATRIX_ROW_KEY;
use crate::constants::pagination::{MAX_LIMIT, MAX_PAGE};
use crate::models::compatibility::{CompatibilityPatch, NewCompatibility, PairInput};
use crate::models::product::{
    NewProduct, ProductFilter, ProductPatch, ProductQuery, StockUpdate,
};
use crate::models::user::{NewUser, UserPatch, UserQuery, UserRole};
use crate::models::{PageRequest, SortField, SortOrder};

const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 128;
const PERSON_NAME_MAX: usize = 50;
const PRODUCT_NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 1000;
const CATEGORY_MAX: usize = 50;
const METAL_NAME_MAX: usize = 100;
const CHEMICAL_NAME_MAX: usize = 100;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
}

fn person_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[a-zA-Z\s]+$")
}

#[derive(Debug, Default)]
struct Checker {
    errors: FieldErrors,
}

impl Checker {
    fn error(&mut self, field: &str, msg: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(msg.into());
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }

    /// Trimmed text with a length cap. `None` when absent or invalid.
    fn text(
        &mut self,
        field: &str,
        value: Option<&str>,
        label: &str,
        max: usize,
        required: bool,
    ) -> Option<String> {
        let Some(value) = value.map(str::trim) else {
            if required {
                self.error(field, format!("{label} is required"));
            }
            return None;
        };

        if value.is_empty() {
            if required {
                self.error(field, format!("{label} is required"));
            } else {
                self.error(field, format!("{label} cannot be empty"));
            }
            return None;
        }
        if value.chars().count() > max {
            self.error(field, format!("{label} cannot exceed {max} characters"));
            return None;
        }

        Some(value.to_string())
    }

    fn email(&mut self, field: &str, value: Option<&str>, required: bool) -> Option<String> {
        let email = self.text(field, value, "Email", EMAIL_MAX, required)?;
        if !email_regex().is_match(&email) {
            self.error(field, "Invalid email format");
            return None;
        }
        Some(email)
    }

    fn person_name(
        &mut self,
        field: &str,
        value: Option<&str>,
        label: &str,
        required: bool,
    ) -> Option<String> {
        let name = self.text(field, value, label, PERSON_NAME_MAX, required)?;
        if !person_name_regex().is_match(&name) {
            self.error(field, format!("{label} can only contain letters and spaces"));
            return None;
        }
        Some(name)
    }

    /// Passwords are not trimmed.
    fn strong_password(&mut self, field: &str, value: Option<&str>, label: &str) -> Option<String> {
        let Some(password) = value else {
            self.error(field, format!("{label} is required"));
            return None;
        };

        let len = password.chars().count();
        let mut ok = true;
        if len < PASSWORD_MIN {
            self.error(
                field,
                format!("{label} must be at least {PASSWORD_MIN} characters long"),
            );
            ok = false;
        }
        if len > PASSWORD_MAX {
            self.error(field, format!("{label} cannot exceed {PASSWORD_MAX} characters"));
            ok = false;
        }
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            self.error(
                field,
                format!(
                    "{label} must contain at least one lowercase letter, one uppercase letter, and one number"
                ),
            );
            ok = false;
        }

        ok.then(|| password.to_string())
    }

    fn present_password(&mut self, field: &str, value: Option<&str>, label: &str) -> Option<String> {
        match value {
            Some(p) if !p.is_empty() => Some(p.to_string()),
            _ => {
                self.error(field, format!("{label} is required"));
                None
            }
        }
    }

    fn role(&mut self, field: &str, value: Option<&str>) -> Option<UserRole> {
        let value = value?;
        match value.parse::<UserRole>() {
            Ok(role) => Some(role),
            Err(_) => {
                self.error(field, "Role must be one of: user, admin, moderator");
                None
            }
        }
    }

    fn flag(&mut self, field: &str, value: Option<&str>) -> Option<bool> {
        match value? {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.error(field, format!("{field} must be true or false"));
                None
            }
        }
    }

    fn number(&mut self, field: &str, value: Option<&str>) -> Option<f64> {
        let value = value?.trim();
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                self.error(field, format!("{field} must be a number"));
                None
            }
        }
    }

    fn page<S: SortField>(&mut self, params: &PageParams) -> PageRequest<S> {
        let mut request = PageRequest::<S>::default();

        if let Some(raw) = &params.page {
            match raw.trim().parse::<u64>() {
                Ok(page) if (1..=MAX_PAGE).contains(&page) => request.page = page,
                Ok(page) if page > MAX_PAGE => {
                    self.error("page", format!("Page must not exceed {MAX_PAGE}"));
                }
                _ => self.error("page", "Page must be a positive integer"),
            }
        }

        if let Some(raw) = &params.limit {
            match raw.trim().parse::<u64>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => request.limit = limit,
                _ => self.error("limit", format!("Limit must be between 1 and {MAX_LIMIT}")),
            }
        }

        if let Some(raw) = &params.sort_by {
            match S::parse(raw) {
                Some(field) => request.sort_by = field,
                None => self.error(
                    "sortBy",
                    format!("sortBy must be one of: {}", S::ALLOWED.join(", ")),
                ),
            }
        }

        if let Some(raw) = &params.sort_order {
            match SortOrder::parse(raw) {
                Some(order) => request.sort_order = order,
                None => self.error("sortOrder", "sortOrder must be asc or desc"),
            }
        }

        request
    }
}

/// Extracts the value or reports the map of field errors.
fn done<T>(checker: Checker, value: Option<T>) -> Result<T, ApiError> {
    checker.finish()?;
    value.ok_or_else(|| ApiError::internal("validation produced no value"))
}

pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Invalid ID format"))
}

pub fn page_request<S: SortField>(params: &PageParams) -> Result<PageRequest<S>, ApiError> {
    let mut c = Checker::default();
    let page = c.page(params);
    c.finish()?;
    Ok(page)
}

// Users

pub fn register(req: &RegisterRequest) -> Result<NewUser, ApiError> {
    let mut c = Checker::default();

    let email = c.email("email", req.email.as_deref(), true);
    let password = c.strong_password("password", req.password.as_deref(), "Password");
    let first_name = c.person_name("firstName", req.first_name.as_deref(), "First name", true);
    let last_name = c.person_name("lastName", req.last_name.as_deref(), "Last name", true);
    let role = c.role("role", req.role.as_deref()).unwrap_or_default();

    let user = match (email, password, first_name, last_name) {
        (Some(email), Some(password), Some(first_name), Some(last_name)) => Some(NewUser {
            email,
            password,
            first_name,
            last_name,
            role,
        }),
        _ => None,
    };
    done(c, user)
}

pub fn login(req: &LoginRequest) -> Result<(String, String), ApiError> {
    let mut c = Checker::default();

    let email = c.email("email", req.email.as_deref(), true);
    let password = c.present_password("password", req.password.as_deref(), "Password");

    done(c, email.zip(password))
}

pub fn user_update(req: &UpdateUserRequest) -> Result<UserPatch, ApiError> {
    let mut c = Checker::default();

    let patch = UserPatch {
        email: c.email("email", req.email.as_deref(), false),
        first_name: c.person_name("firstName", req.first_name.as_deref(), "First name", false),
        last_name: c.person_name("lastName", req.last_name.as_deref(), "Last name", false),
        role: c.role("role", req.role.as_deref()),
        is_active: req.is_active,
    };

    let nothing_sent = req.email.is_none()
        && req.first_name.is_none()
        && req.last_name.is_none()
        && req.role.is_none()
        && req.is_active.is_none();
    if nothing_sent {
        c.error("body", "At least one field must be provided for update");
    }

    done(c, Some(patch))
}

pub fn change_password(req: &ChangePasswordRequest) -> Result<(String, String), ApiError> {
    let mut c = Checker::default();

    let old = c.present_password("oldPassword", req.old_password.as_deref(), "Old password");
    let new = c.strong_password("newPassword", req.new_password.as_deref(), "New password");

    done(c, old.zip(new))
}

pub fn reset_request(req: &ResetPasswordRequest) -> Result<String, ApiError> {
    let mut c = Checker::default();
    let email = c.email("email", req.email.as_deref(), true);
    done(c, email)
}

pub fn confirm_reset(req: &ConfirmResetRequest) -> Result<(String, String), ApiError> {
    let mut c = Checker::default();

    let token = c.present_password("token", req.token.as_deref(), "Token");
    let new = c.strong_password("newPassword", req.new_password.as_deref(), "New password");

    done(c, token.zip(new))
}

pub fn user_query(params: &UserListParams) -> Result<UserQuery, ApiError> {
    let mut c = Checker::default();

    let query = UserQuery {
        page: c.page(&params.page),
        search: params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        role: c.role("role", params.role.as_deref()),
        is_active: c.flag("isActive", params.is_active.as_deref()),
    };

    done(c, Some(query))
}

// Products

fn price(c: &mut Checker, value: Option<f64>, required: bool) -> Option<f64> {
    match value {
        None => {
            if required {
                c.error("price", "Price is required");
            }
            None
        }
        Some(p) if !p.is_finite() || p <= 0.0 => {
            c.error("price", "Price must be positive");
            None
        }
        Some(p) => Some(p),
    }
}

fn stock(c: &mut Checker, value: Option<i64>) -> Option<i64> {
    match value {
        Some(s) if s < 0 => {
            c.error("stock", "Stock cannot be negative");
            None
        }
        other => other,
    }
}

pub fn new_product(req: &CreateProductRequest) -> Result<NewProduct, ApiError> {
    let mut c = Checker::default();

    let name = c.text("name", req.name.as_deref(), "Product name", PRODUCT_NAME_MAX, true);
    let description = c.text(
        "description",
        req.description.as_deref(),
        "Product description",
        DESCRIPTION_MAX,
        true,
    );
    let price = price(&mut c, req.price, true);
    let category = c.text("category", req.category.as_deref(), "Category", CATEGORY_MAX, true);
    let stock = stock(&mut c, req.stock).unwrap_or(0);

    let product = match (name, description, price, category) {
        (Some(name), Some(description), Some(price), Some(category)) => Some(NewProduct {
            name,
            description,
            price,
            category,
            stock,
        }),
        _ => None,
    };
    done(c, product)
}

pub fn product_update(req: &UpdateProductRequest) -> Result<ProductPatch, ApiError> {
    let mut c = Checker::default();

    let patch = ProductPatch {
        name: c.text("name", req.name.as_deref(), "Product name", PRODUCT_NAME_MAX, false),
        description: c.text(
            "description",
            req.description.as_deref(),
            "Product description",
            DESCRIPTION_MAX,
            false,
        ),
        price: price(&mut c, req.price, false),
        category: c.text("category", req.category.as_deref(), "Category", CATEGORY_MAX, false),
        stock: stock(&mut c, req.stock),
        is_active: req.is_active,
    };

    let nothing_sent = req.name.is_none()
        && req.description.is_none()
        && req.price.is_none()
        && req.category.is_none()
        && req.stock.is_none()
        && req.is_active.is_none();
    if nothing_sent {
        c.error("body", "At least one field must be provided for update");
    }

    done(c, Some(patch))
}

pub fn stock_quantity(quantity: Option<i64>) -> Result<i64, ApiError> {
    let mut c = Checker::default();
    let quantity = match quantity {
        None => {
            c.error("quantity", "Quantity is required");
            None
        }
        Some(0) => {
            c.error("quantity", "Quantity cannot be zero");
            None
        }
        Some(q) => Some(q),
    };
    done(c, quantity)
}

pub fn bulk_stock(req: &BulkStockRequest) -> Result<Vec<StockUpdate>, ApiError> {
    let items = req
        .updates
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Updates array is required and cannot be empty"))?;

    let mut c = Checker::default();
    let mut updates = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match parse_id(&item.id) {
            Ok(id) => updates.push(StockUpdate {
                id,
                quantity: item.quantity,
            }),
            Err(_) => c.error(&format!("updates.{i}.id"), "Invalid ID format"),
        }
    }

    done(c, Some(updates))
}

pub fn product_query(params: &ProductListParams) -> Result<ProductQuery, ApiError> {
    let mut c = Checker::default();

    let query = ProductQuery {
        page: c.page(&params.page),
        filter: ProductFilter {
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category: params.category.clone().filter(|s| !s.is_empty()),
            min_price: c.number("minPrice", params.min_price.as_deref()),
            max_price: c.number("maxPrice", params.max_price.as_deref()),
            in_stock: c.flag("inStock", params.in_stock.as_deref()),
            is_active: c.flag("isActive", params.is_active.as_deref()),
        },
    };

    done(c, Some(query))
}

pub fn price_bounds(min: Option<&str>, max: Option<&str>) -> Result<(f64, f64), ApiError> {
    if min.is_none() || max.is_none() {
        return Err(ApiError::bad_request("Both minPrice and maxPrice are required"));
    }

    let mut c = Checker::default();
    let min = c.number("minPrice", min);
    let max = c.number("maxPrice", max);
    done(c, min.zip(max))
}

pub fn threshold(raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::field("threshold", "threshold must be an integer"))
}

// Metals

pub fn metal_name(req: &MetalRequest) -> Result<String, ApiError> {
    let mut c = Checker::default();
    let name = c.text("name", req.name.as_deref(), "Metal name", METAL_NAME_MAX, true);
    if name
        .as_deref()
        .is_some_and(|n| n.eq_ignore_ascii_case(MATRIX_ROW_KEY))
    {
        c.error("name", format!("Metal name cannot be {MATRIX_ROW_KEY}"));
    }
    done(c, name)
}

// Compatibility matrix

fn pairs(c: &mut Checker, req: &CompatibilityRequest, required: bool) -> Option<Vec<PairInput>> {
    let Some(items) = &req.compatibilities else {
        if required {
            c.error(
                "compatibilities",
                "At least one metal compatibility is required",
            );
        }
        return None;
    };

    if required && items.is_empty() {
        c.error(
            "compatibilities",
            "At least one metal compatibility is required",
        );
        return None;
    }

    let mut pairs = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match parse_id(&item.metal) {
            Ok(metal_id) => pairs.push(PairInput {
                metal_id,
                is_compatible: item.is_compatible,
            }),
            Err(_) => {
                c.error(&format!("compatibilities.{i}.metal"), "Invalid metal ID");
                ok = false;
            }
        }
    }

    ok.then_some(pairs)
}

pub fn new_compatibility(req: &CompatibilityRequest) -> Result<NewCompatibility, ApiError> {
    let mut c = Checker::default();

    let chemical_name = c.text(
        "chemicalName",
        req.chemical_name.as_deref(),
        "Chemical name",
        CHEMICAL_NAME_MAX,
        true,
    );
    let compatibilities = pairs(&mut c, req, true);

    let entry = chemical_name
        .zip(compatibilities)
        .map(|(chemical_name, compatibilities)| NewCompatibility {
            chemical_name,
            compatibilities,
        });
    done(c, entry)
}

pub fn compatibility_patch(req: &CompatibilityRequest) -> Result<CompatibilityPatch, ApiError> {
    let mut c = Checker::default();

    if req.chemical_name.is_none() && req.compatibilities.is_none() {
        c.error("body", "At least one field must be provided for update");
    }

    let patch = CompatibilityPatch {
        chemical_name: c.text(
            "chemicalName",
            req.chemical_name.as_deref(),
            "Chemical name",
            CHEMICAL_NAME_MAX,
            false,
        ),
        compatibilities: pairs(&mut c, req, false),
    };

    done(c, Some(patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{PairRequest, StockItemRequest};
    use crate::models::product::ProductSortField;

    fn field_errors(result: Result<impl std::fmt::Debug, ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            first_name: Some("Ann".to_string()),
            last_name: Some("Lee".to_string()),
            role: None,
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
    }

    #[test]
    fn test_register_accepts_valid_payload() {
        let user = register(&register_req("a@x.com", "Secret123")).unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, UserRole::User);
    }

    #[test]
    fn test_register_reports_every_bad_field() {
        let errors = field_errors(register(&RegisterRequest {
            email: Some("nope".to_string()),
            password: Some("short".to_string()),
            first_name: Some("R2D2".to_string()),
            last_name: None,
            role: Some("root".to_string()),
        }));

        assert_eq!(errors["email"], vec!["Invalid email format"]);
        assert_eq!(errors["password"].len(), 2);
        assert!(errors.contains_key("firstName"));
        assert_eq!(errors["lastName"], vec!["Last name is required"]);
        assert!(errors.contains_key("role"));
    }

    #[test]
    fn test_password_needs_mixed_characters() {
        let errors = field_errors(register(&register_req("a@x.com", "alllowercase1")));
        assert!(errors["password"][0].contains("uppercase"));
    }

    #[test]
    fn test_empty_user_update_is_rejected() {
        let errors = field_errors(user_update(&UpdateUserRequest::default()));
        assert!(errors.contains_key("body"));
    }

    #[test]
    fn test_page_params() {
        let page: PageRequest<ProductSortField> = page_request(&PageParams {
            page: Some("3".to_string()),
            limit: Some("25".to_string()),
            sort_by: Some("price".to_string()),
            sort_order: Some("asc".to_string()),
        })
        .unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 25);
        assert_eq!(page.sort_by, ProductSortField::Price);
        assert_eq!(page.sort_order, SortOrder::Asc);

        let errors = field_errors(page_request::<ProductSortField>(&PageParams {
            page: Some("0".to_string()),
            limit: Some("101".to_string()),
            sort_by: Some("password".to_string()),
            sort_order: Some("sideways".to_string()),
        }));
        assert_eq!(errors.len(), 4);

        let errors = field_errors(page_request::<ProductSortField>(&PageParams {
            page: Some("1000000000000000000".to_string()),
            ..Default::default()
        }));
        assert_eq!(errors["page"], vec![format!("Page must not exceed {MAX_PAGE}")]);

        let last: PageRequest<ProductSortField> = page_request(&PageParams {
            page: Some(MAX_PAGE.to_string()),
            limit: Some(MAX_LIMIT.to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(i64::try_from((last.page - 1) * last.limit).is_ok());
    }

    #[test]
    fn test_product_rules() {
        let errors = field_errors(new_product(&CreateProductRequest {
            name: Some("   ".to_string()),
            description: Some("x".repeat(1001)),
            price: Some(0.0),
            category: Some("tools".to_string()),
            stock: Some(-1),
        }));
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("description"));
        assert_eq!(errors["price"], vec!["Price must be positive"]);
        assert_eq!(errors["stock"], vec!["Stock cannot be negative"]);

        let product = new_product(&CreateProductRequest {
            name: Some(" Widget ".to_string()),
            description: Some("A widget".to_string()),
            price: Some(2.5),
            category: Some("tools".to_string()),
            stock: None,
        })
        .unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_stock_quantity() {
        assert_eq!(stock_quantity(Some(-3)).unwrap(), -3);
        assert!(stock_quantity(Some(0)).is_err());
        assert!(stock_quantity(None).is_err());
    }

    #[test]
    fn test_bulk_stock_requires_items() {
        assert!(matches!(
            bulk_stock(&BulkStockRequest { updates: Some(vec![]) }),
            Err(ApiError::BadRequest(_))
        ));

        let errors = field_errors(bulk_stock(&BulkStockRequest {
            updates: Some(vec![StockItemRequest {
                id: "x".to_string(),
                quantity: 1,
            }]),
        }));
        assert!(errors.contains_key("updates.0.id"));
    }

    #[test]
    fn test_compatibility_requires_pairs() {
        let errors = field_errors(new_compatibility(&CompatibilityRequest {
            chemical_name: Some("Acetone".to_string()),
            compatibilities: Some(vec![]),
        }));
        assert!(errors.contains_key("compatibilities"));

        let entry = new_compatibility(&CompatibilityRequest {
            chemical_name: Some("Acetone".to_string()),
            compatibilities: Some(vec![PairRequest {
                metal: "4".to_string(),
                is_compatible: true,
            }]),
        })
        .unwrap();
        assert_eq!(entry.compatibilities[0].metal_id, 4);
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(price_bounds(Some("1"), Some("2.5")).unwrap(), (1.0, 2.5));
        assert!(matches!(
            price_bounds(Some("1"), None),
            Err(ApiError::BadRequest(_))
        ));
        assert!(price_bounds(Some("one"), Some("2")).is_err());
    }

    #[test]
    fn test_metal_name_cannot_shadow_row_label() {
        let named = |name: &str| MetalRequest {
            name: Some(name.to_string()),
        };

        assert_eq!(metal_name(&named("  Titanium ")).unwrap(), "Titanium");
        for reserved in ["chemicalName", "CHEMICALNAME"] {
            let errors = field_errors(metal_name(&named(reserved)));
            assert_eq!(errors["name"], vec!["Metal name cannot be chemicalName"]);
        }
    }
}

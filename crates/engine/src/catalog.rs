//! Built-in back-office wizards.
//!
//! Both wizards share the geographic cascade (`departamento` → `municipio`);
//! the order wizard adds a customer lookup by identity number and a product
//! cascade (`categoria` → `producto`).

use wizard_types::{FieldConstraints, FieldDescriptor, StepDefinition, WizardDefinition};

/// Provider keys used by the catalog wizards.
pub mod providers {
    pub const DEPARTAMENTOS: &str = "departamentos";
    pub const MUNICIPIOS: &str = "municipios";
    pub const CATEGORIAS: &str = "categorias";
    pub const PRODUCTOS: &str = "productos";
}

/// Lookup key resolving a customer id from an identity number.
pub const CUSTOMER_BY_CI: &str = "customer_by_ci";

fn location_fields(step: StepDefinition) -> StepDefinition {
    step.with_field(
        FieldDescriptor::select("departamento", providers::DEPARTAMENTOS)
            .label("Departamento")
            .required(),
    )
    .with_field(
        FieldDescriptor::dependent_select("municipio", providers::MUNICIPIOS, "departamento")
            .label("Municipio")
            .required(),
    )
}

/// Address form: location, then street details.
pub fn address_wizard() -> WizardDefinition {
    WizardDefinition::new("address")
        .with_title("Dirección")
        .with_step(location_fields(StepDefinition::new("Ubicación")))
        .with_step(
            StepDefinition::new("Detalle")
                .with_field(FieldDescriptor::text("zona").label("Zona"))
                .with_field(
                    FieldDescriptor::text("calle")
                        .label("Calle")
                        .required()
                        .with_constraints(FieldConstraints {
                            max_length: Some(120),
                            ..Default::default()
                        }),
                )
                .with_field(FieldDescriptor::text("numero").label("Número"))
                .with_field(FieldDescriptor::textarea("referencia").label("Referencia"))
                .with_field(FieldDescriptor::hidden("usuario_id")),
        )
}

/// Order form: customer, delivery location, then product and amounts.
pub fn order_wizard() -> WizardDefinition {
    WizardDefinition::new("order")
        .with_title("Pedido")
        .with_step(
            StepDefinition::new("Cliente")
                .with_field(
                    FieldDescriptor::lookup_text("ci", CUSTOMER_BY_CI, "cliente_id")
                        .label("CI")
                        .required()
                        .with_constraints(FieldConstraints {
                            pattern: Some("^[0-9]{5,10}$".to_string()),
                            ..Default::default()
                        }),
                )
                .with_field(FieldDescriptor::hidden("cliente_id"))
                .with_field(FieldDescriptor::display("cliente_nombre").label("Cliente")),
        )
        .with_step(
            location_fields(StepDefinition::new("Entrega"))
                .with_field(FieldDescriptor::text("direccion").label("Dirección").required()),
        )
        .with_step(
            StepDefinition::new("Producto")
                .with_field(FieldDescriptor::select("categoria", providers::CATEGORIAS).label("Categoría"))
                .with_field(
                    FieldDescriptor::dependent_select("producto", providers::PRODUCTOS, "categoria")
                        .label("Producto")
                        .required(),
                )
                .with_field(
                    FieldDescriptor::number("cantidad")
                        .label("Cantidad")
                        .required()
                        .with_constraints(FieldConstraints {
                            min: Some(1.0),
                            ..Default::default()
                        }),
                )
                .with_field(
                    FieldDescriptor::number("total")
                        .label("Total")
                        .required()
                        .with_constraints(FieldConstraints {
                            min: Some(0.0),
                            ..Default::default()
                        }),
                ),
        )
}

//! Built-in policies for the commerce back office.
//!
//! Permission tokens follow `<resource>.<action>.<scope>` for instance
//! actions (`order.view.any`, `order.view.own`) and `<resource>.<action>` for
//! type-level actions (`order.create`, `order.export`). Every resource type
//! lets administrators through first unless a guard applies to everyone.

use policy::{Rule, RuleRegistry};

use crate::Result;
use crate::table::{OwnershipConfig, PolicyTable, ResourceTable};

/// Role names referenced by the catalog.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const HR_MANAGER: &str = "hr_manager";
    pub const CATALOG_MANAGER: &str = "catalog_manager";
    pub const PROVIDER_MANAGER: &str = "provider_manager";
    pub const SUPPORT_AGENT: &str = "support_agent";
}

use roles::{ADMIN, CATALOG_MANAGER, HR_MANAGER, PROVIDER_MANAGER, SUPPORT_AGENT};

/// Builds the commerce policy table.
pub fn commerce_table() -> PolicyTable {
    let mut table = PolicyTable::new();
    orders(&mut table);
    products(&mut table);
    providers(&mut table);
    employees(&mut table);
    customers(&mut table);
    table
}

/// Builds the commerce registry.
pub fn commerce_registry() -> Result<RuleRegistry> {
    commerce_table().into_registry()
}

/// `[has_role(roles...), has_permission(<prefix>.<action>.any), all(own, is_owner)]`
fn scoped_with_roles(prefix: &str, action: &str, override_roles: &[&str]) -> Vec<Rule> {
    let mut rules = vec![Rule::any_role(override_roles.iter().copied())];
    rules.extend(Rule::scoped(prefix, action));
    rules
}

/// Type-level listing: anyone who may see some instances may list them.
fn view_any(prefix: &str, override_roles: &[&str]) -> Vec<Rule> {
    vec![
        Rule::any_role(override_roles.iter().copied()),
        Rule::permission(format!("{prefix}.view.any")),
        Rule::permission(format!("{prefix}.view.own")),
    ]
}

/// Type-level action gated by a role override or one unscoped permission.
fn unscoped(prefix: &str, action: &str, override_roles: &[&str]) -> Vec<Rule> {
    vec![
        Rule::any_role(override_roles.iter().copied()),
        Rule::permission(format!("{prefix}.{action}")),
    ]
}

/// Standard CRUD set shared by most resource types.
fn crud(resource: &mut ResourceTable, prefix: &str, override_roles: &[&str]) {
    resource
        .action("viewAny", view_any(prefix, override_roles))
        .action("view", scoped_with_roles(prefix, "view", override_roles))
        .action("create", unscoped(prefix, "create", override_roles))
        .action("update", scoped_with_roles(prefix, "update", override_roles))
        .action("delete", scoped_with_roles(prefix, "delete", override_roles))
        .action("restore", scoped_with_roles(prefix, "restore", override_roles))
        .action("forceDelete", vec![Rule::role(ADMIN)]);
}

/// Orders that have not left the warehouse. A missing status matches nothing.
fn cancellable_status() -> Rule {
    Rule::any(vec![
        Rule::attr_eq("status", "pending"),
        Rule::attr_eq("status", "processing"),
    ])
}

fn orders(table: &mut PolicyTable) {
    let order = table.resource("Order");
    crud(order, "order", &[ADMIN]);
    order
        // Customers may only edit their own orders before fulfilment starts.
        .action(
            "update",
            vec![
                Rule::role(ADMIN),
                Rule::permission("order.update.any"),
                Rule::all(vec![
                    Rule::permission("order.update.own"),
                    Rule::IsOwner,
                    Rule::attr_eq("status", "pending"),
                ]),
            ],
        )
        .action(
            "cancel",
            vec![
                Rule::role(ADMIN),
                Rule::all(vec![
                    Rule::permission("order.cancel.any"),
                    cancellable_status(),
                ]),
                Rule::all(vec![
                    Rule::permission("order.cancel.own"),
                    Rule::IsOwner,
                    Rule::attr_eq("status", "pending"),
                ]),
            ],
        )
        .action("archive", scoped_with_roles("order", "archive", &[ADMIN]))
        .action("export", unscoped("order", "export", &[ADMIN]))
        .action("bulkDelete", unscoped("order", "bulk_delete", &[ADMIN]));

    let item = table.resource("OrderItem");
    item.ownership(OwnershipConfig::Parent {
        resource_type: "Order".to_string(),
    });
    for action in ["view", "update", "delete"] {
        item.action(action, scoped_with_roles("order_item", action, &[ADMIN]));
    }
    item.action(
        "create",
        vec![
            Rule::role(ADMIN),
            Rule::permission("order_item.create.any"),
            Rule::all(vec![
                Rule::permission("order_item.create.own"),
                Rule::IsOwner,
            ]),
        ],
    );
}

fn products(table: &mut PolicyTable) {
    let product = table.resource("Product");
    crud(product, "product", &[ADMIN, CATALOG_MANAGER]);
    product
        .action(
            "approve",
            vec![Rule::all(vec![
                Rule::any(vec![
                    Rule::any_role([ADMIN, CATALOG_MANAGER]),
                    Rule::permission("product.approve.any"),
                ]),
                Rule::attr_eq("status", "pending_review"),
            ])],
        )
        .action(
            "archive",
            scoped_with_roles("product", "archive", &[ADMIN, CATALOG_MANAGER]),
        )
        .action(
            "export",
            unscoped("product", "export", &[ADMIN, CATALOG_MANAGER]),
        )
        .action(
            "bulkDelete",
            unscoped("product", "bulk_delete", &[ADMIN]),
        );
}

fn providers(table: &mut PolicyTable) {
    let provider = table.resource("Provider");
    crud(provider, "provider", &[ADMIN, PROVIDER_MANAGER]);
    provider
        .action(
            "verify",
            vec![Rule::all(vec![
                Rule::any(vec![
                    Rule::any_role([ADMIN, PROVIDER_MANAGER]),
                    Rule::permission("provider.verify.any"),
                ]),
                Rule::attr_eq("verification_status", "pending"),
            ])],
        )
        .action(
            "approve",
            vec![Rule::all(vec![
                Rule::any(vec![
                    Rule::any_role([ADMIN, PROVIDER_MANAGER]),
                    Rule::permission("provider.approve.any"),
                ]),
                Rule::attr_eq("verification_status", "verified"),
            ])],
        )
        .action(
            "archive",
            unscoped("provider", "archive", &[ADMIN, PROVIDER_MANAGER]),
        )
        .action(
            "export",
            unscoped("provider", "export", &[ADMIN, PROVIDER_MANAGER]),
        );

    let location = table.resource("ProviderLocation");
    location.ownership(OwnershipConfig::Parent {
        resource_type: "Provider".to_string(),
    });
    for action in ["view", "update"] {
        location.action(
            action,
            scoped_with_roles("provider_location", action, &[ADMIN, PROVIDER_MANAGER]),
        );
    }
    location
        .action(
            "create",
            vec![
                Rule::any_role([ADMIN, PROVIDER_MANAGER]),
                Rule::permission("provider_location.create.any"),
                Rule::all(vec![
                    Rule::permission("provider_location.create.own"),
                    Rule::IsOwner,
                ]),
            ],
        )
        // A provider's primary location can never be deleted, even by admins.
        // Snapshots must state `is_primary: false` explicitly.
        .action(
            "delete",
            vec![Rule::all(vec![
                Rule::attr_eq("is_primary", false),
                Rule::any(scoped_with_roles(
                    "provider_location",
                    "delete",
                    &[ADMIN, PROVIDER_MANAGER],
                )),
            ])],
        );
}

fn employees(table: &mut PolicyTable) {
    let hr = [ADMIN, HR_MANAGER];

    let employee = table.resource("Employee");
    // Employee records link to the employee's login through `user_id`.
    employee.ownership(OwnershipConfig::Attribute {
        key: "user_id".to_string(),
    });
    employee
        .action("viewAny", view_any("employee", &hr))
        .action("view", scoped_with_roles("employee", "view", &hr))
        .action("create", unscoped("employee", "create", &hr))
        .action("update", scoped_with_roles("employee", "update", &hr))
        .action("delete", vec![Rule::role(ADMIN)])
        .action("archive", unscoped("employee", "archive", &hr))
        .action("export", unscoped("employee", "export", &hr));

    let note = table.resource("EmployeeNote");
    note.action("viewAny", view_any("employee_note", &hr))
        .action(
            "view",
            vec![
                Rule::any_role(hr),
                Rule::all(vec![
                    Rule::permission("employee_note.view.any"),
                    Rule::attr_eq("is_private", false),
                ]),
                Rule::all(vec![
                    Rule::permission("employee_note.view.own"),
                    Rule::IsOwner,
                ]),
            ],
        )
        .action("create", unscoped("employee_note", "create", &hr))
        .action(
            "update",
            vec![
                Rule::role(ADMIN),
                Rule::all(vec![
                    Rule::permission("employee_note.update.own"),
                    Rule::IsOwner,
                ]),
            ],
        )
        .action(
            "delete",
            vec![
                Rule::role(ADMIN),
                Rule::all(vec![
                    Rule::permission("employee_note.delete.own"),
                    Rule::IsOwner,
                ]),
            ],
        );

    let department = table.resource("EmployeeDepartment");
    department
        .action("viewAny", view_any("employee_department", &hr))
        .action(
            "view",
            vec![
                Rule::any_role(hr),
                Rule::permission("employee_department.view.any"),
            ],
        )
        .action("create", unscoped("employee_department", "create", &hr))
        .action(
            "update",
            vec![
                Rule::any_role(hr),
                Rule::permission("employee_department.update.any"),
            ],
        )
        // Departments that still have employees cannot be deleted by anyone.
        .action(
            "delete",
            vec![Rule::all(vec![
                Rule::permission("employee_department.delete.any"),
                Rule::attr_eq("employee_count", 0),
            ])],
        );
}

fn customers(table: &mut PolicyTable) {
    let staff = [ADMIN, SUPPORT_AGENT];

    let customer = table.resource("Customer");
    crud(customer, "customer", &staff);
    customer.action("export", unscoped("customer", "export", &[ADMIN]));

    let note = table.resource("CustomerNote");
    note.action("viewAny", view_any("customer_note", &staff))
        .action("view", scoped_with_roles("customer_note", "view", &staff))
        .action("create", unscoped("customer_note", "create", &staff))
        .action(
            "update",
            vec![
                Rule::role(ADMIN),
                Rule::all(vec![
                    Rule::permission("customer_note.update.own"),
                    Rule::IsOwner,
                ]),
            ],
        )
        .action(
            "delete",
            vec![
                Rule::role(ADMIN),
                Rule::all(vec![
                    Rule::permission("customer_note.delete.own"),
                    Rule::IsOwner,
                ]),
            ],
        );

    let communication = table.resource("CustomerCommunication");
    communication.ownership(OwnershipConfig::Parent {
        resource_type: "Customer".to_string(),
    });
    communication
        .action(
            "viewAny",
            view_any("customer_communication", &staff),
        )
        .action(
            "view",
            scoped_with_roles("customer_communication", "view", &staff),
        )
        .action(
            "create",
            unscoped("customer_communication", "create", &staff),
        )
        .action("delete", vec![Rule::role(ADMIN)]);

    let preference = table.resource("CustomerPreference");
    preference.ownership(OwnershipConfig::Parent {
        resource_type: "Customer".to_string(),
    });
    for action in ["view", "update"] {
        preference.action(
            action,
            scoped_with_roles("customer_preference", action, &staff),
        );
    }
}

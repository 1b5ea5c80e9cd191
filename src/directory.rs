//! Static employee directory and department resources.

use chrono::NaiveDate;

use crate::models::{Employee, MEAT_MARKET, Resource, ResourceKind, Role};

pub const DEPARTMENTS: [&str; 5] = [MEAT_MARKET, "Deli", "Produce", "Grocery", "Cashier"];

pub const MEAT_MARKET_POSITIONS: [&str; 5] =
    ["Manager", "Assistant Manager", "Meat Cutter", "Cleanup", "Trainee"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTab {
    All,
    Recent,
    Favorites,
}

impl ResourceTab {
    pub fn label(self) -> &'static str {
        match self {
            ResourceTab::All => "All",
            ResourceTab::Recent => "Recent",
            ResourceTab::Favorites => "Favorites",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ResourceTab::All => ResourceTab::Recent,
            ResourceTab::Recent => ResourceTab::Favorites,
            ResourceTab::Favorites => ResourceTab::All,
        }
    }
}

struct EmployeeSeed {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    department: &'static str,
    role: Role,
    hire_date: (i32, u32, u32),
    position: Option<&'static str>,
    address: &'static str,
    emergency_contact: &'static str,
    bio: &'static str,
}

const EMPLOYEES: [EmployeeSeed; 14] = [
    EmployeeSeed {
        id: "emp-shane",
        name: "Shane",
        email: "shane@example.com",
        phone: "(555) 123-4567",
        department: MEAT_MARKET,
        role: Role::Manager,
        hire_date: (2018, 5, 15),
        position: Some("Manager"),
        address: "123 Main St, Hanceville, AL",
        emergency_contact: "Jane Doe (555) 987-6543",
        bio: "Department manager with over 10 years of experience in the meat industry.",
    },
    EmployeeSeed {
        id: "emp-james",
        name: "James",
        email: "james@example.com",
        phone: "(555) 234-5678",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2019, 6, 22),
        position: Some("Assistant Manager"),
        address: "456 Oak Ave, Hanceville, AL",
        emergency_contact: "John Smith (555) 876-5432",
        bio: "Assistant manager responsible for inventory management and staff scheduling.",
    },
    EmployeeSeed {
        id: "emp-randy",
        name: "Randy",
        email: "randy@example.com",
        phone: "(555) 345-6789",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2020, 3, 10),
        position: Some("Meat Cutter"),
        address: "789 Pine St, Hanceville, AL",
        emergency_contact: "Mary Johnson (555) 765-4321",
        bio: "Experienced meat cutter specializing in custom cuts and special orders.",
    },
    EmployeeSeed {
        id: "emp-david",
        name: "David",
        email: "david@example.com",
        phone: "(555) 456-7890",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2021, 1, 5),
        position: Some("Meat Cutter"),
        address: "101 Elm St, Hanceville, AL",
        emergency_contact: "Robert Brown (555) 654-3210",
        bio: "Meat cutter with expertise in beef and pork preparation.",
    },
    EmployeeSeed {
        id: "emp-crystal",
        name: "Crystal",
        email: "crystal@example.com",
        phone: "(555) 567-8901",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2019, 11, 15),
        position: Some("Cleanup"),
        address: "202 Maple Ave, Hanceville, AL",
        emergency_contact: "Sarah Wilson (555) 543-2109",
        bio: "Responsible for maintaining cleanliness and sanitation standards in the department.",
    },
    EmployeeSeed {
        id: "emp-jamey",
        name: "Jamey",
        email: "jamey@example.com",
        phone: "(555) 678-9012",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2022, 2, 20),
        position: Some("Meat Cutter"),
        address: "303 Cedar Ln, Hanceville, AL",
        emergency_contact: "Michael Davis (555) 432-1098",
        bio: "Skilled meat cutter with a focus on quality and presentation.",
    },
    EmployeeSeed {
        id: "emp-roland",
        name: "Roland",
        email: "rnisley7361@gmail.com",
        phone: "(555) 789-0123",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2020, 7, 12),
        position: Some("Meat Cutter"),
        address: "404 Birch St, Hanceville, AL",
        emergency_contact: "Jennifer Taylor (555) 321-0987",
        bio: "Experienced meat cutter with excellent customer service skills.",
    },
    EmployeeSeed {
        id: "emp-taylor",
        name: "Taylor",
        email: "taylor@example.com",
        phone: "(555) 890-1234",
        department: MEAT_MARKET,
        role: Role::Associate,
        hire_date: (2021, 9, 3),
        position: Some("Trainee"),
        address: "505 Walnut Dr, Hanceville, AL",
        emergency_contact: "Christopher Miller (555) 210-9876",
        bio: "New team member learning all aspects of meat department operations.",
    },
    EmployeeSeed {
        id: "emp001",
        name: "John Doe",
        email: "john.doe@example.com",
        phone: "(555) 123-4567",
        department: "Deli",
        role: Role::Associate,
        hire_date: (2021, 3, 15),
        position: None,
        address: "606 Cherry St, Hanceville, AL",
        emergency_contact: "Jane Doe (555) 987-6543",
        bio: "Deli associate with expertise in sandwich preparation and customer service.",
    },
    EmployeeSeed {
        id: "emp002",
        name: "Jane Smith",
        email: "jane.smith@example.com",
        phone: "(555) 234-5678",
        department: "Produce",
        role: Role::Associate,
        hire_date: (2020, 6, 22),
        position: None,
        address: "707 Apple Rd, Hanceville, AL",
        emergency_contact: "John Smith (555) 876-5432",
        bio: "Produce associate responsible for maintaining fresh fruit and vegetable displays.",
    },
    EmployeeSeed {
        id: "emp003",
        name: "Bob Johnson",
        email: "bob.johnson@example.com",
        phone: "(555) 345-6789",
        department: "Grocery",
        role: Role::Manager,
        hire_date: (2019, 11, 5),
        position: None,
        address: "808 Peach Ave, Hanceville, AL",
        emergency_contact: "Mary Johnson (555) 765-4321",
        bio: "Grocery department manager overseeing inventory and staff scheduling.",
    },
    EmployeeSeed {
        id: "emp004",
        name: "Alice Williams",
        email: "alice.williams@example.com",
        phone: "(555) 456-7890",
        department: "Cashier",
        role: Role::Associate,
        hire_date: (2022, 1, 10),
        position: None,
        address: "909 Plum St, Hanceville, AL",
        emergency_contact: "Robert Williams (555) 654-3210",
        bio: "Cashier with excellent customer service skills and attention to detail.",
    },
    EmployeeSeed {
        id: "emp005",
        name: "Charlie Brown",
        email: "charlie.brown@example.com",
        phone: "(555) 567-8901",
        department: "Deli",
        role: Role::Associate,
        hire_date: (2021, 8, 17),
        position: None,
        address: "1010 Orange Ln, Hanceville, AL",
        emergency_contact: "Lucy Brown (555) 543-2109",
        bio: "Deli associate specializing in prepared foods and catering orders.",
    },
    EmployeeSeed {
        id: "emp006",
        name: "Diana Prince",
        email: "diana.prince@example.com",
        phone: "(555) 678-9012",
        department: "Produce",
        role: Role::Associate,
        hire_date: (2020, 4, 30),
        position: None,
        address: "1111 Grape Dr, Hanceville, AL",
        emergency_contact: "Steve Trevor (555) 432-1098",
        bio: "Produce associate with knowledge of organic and specialty produce items.",
    },
];

const RESOURCES: [Resource; 6] = [
    Resource {
        id: "res-handbook",
        title: "Employee Handbook",
        category: "Policies",
        description: "Store policies, attendance rules and benefits overview.",
        kind: ResourceKind::Pdf,
        is_recent: false,
        is_favorite: true,
    },
    Resource {
        id: "res-food-safety",
        title: "Food Safety Guidelines",
        category: "Training",
        description: "Temperature logs, cross-contamination and sanitation procedures.",
        kind: ResourceKind::Pdf,
        is_recent: true,
        is_favorite: true,
    },
    Resource {
        id: "res-cut-chart",
        title: "Beef and Pork Cut Chart",
        category: "Training",
        description: "Reference chart for primal and retail cuts used at the counter.",
        kind: ResourceKind::Document,
        is_recent: false,
        is_favorite: false,
    },
    Resource {
        id: "res-inventory",
        title: "Weekly Inventory Sheet",
        category: "Operations",
        description: "Case counts and shrink tracking for the weekly order.",
        kind: ResourceKind::Spreadsheet,
        is_recent: true,
        is_favorite: false,
    },
    Resource {
        id: "res-slicer",
        title: "Slicer Cleaning Walkthrough",
        category: "Training",
        description: "Step-by-step video for breaking down and sanitizing the slicer.",
        kind: ResourceKind::Video,
        is_recent: true,
        is_favorite: false,
    },
    Resource {
        id: "res-holiday",
        title: "Holiday Coverage Plan",
        category: "Operations",
        description: "Volunteer sign-up and coverage expectations for holiday weeks.",
        kind: ResourceKind::Document,
        is_recent: false,
        is_favorite: false,
    },
];

pub fn employees() -> Vec<Employee> {
    EMPLOYEES.iter().map(to_employee).collect()
}

pub fn department_employees(department: &str) -> Vec<Employee> {
    EMPLOYEES
        .iter()
        .filter(|seed| seed.department == department)
        .map(to_employee)
        .collect()
}

pub fn find_employee(id: &str) -> Option<Employee> {
    EMPLOYEES.iter().find(|seed| seed.id == id).map(to_employee)
}

/// Case-insensitive substring match on name, email or department.
pub fn search_employees(query: &str) -> Vec<Employee> {
    let needle = query.trim().to_lowercase();
    employees()
        .into_iter()
        .filter(|employee| {
            needle.is_empty()
                || employee.name.to_lowercase().contains(&needle)
                || employee.email.to_lowercase().contains(&needle)
                || employee.department.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn search_resources(query: &str, tab: ResourceTab) -> Vec<&'static Resource> {
    let needle = query.trim().to_lowercase();
    RESOURCES
        .iter()
        .filter(|resource| match tab {
            ResourceTab::All => true,
            ResourceTab::Recent => resource.is_recent,
            ResourceTab::Favorites => resource.is_favorite,
        })
        .filter(|resource| {
            needle.is_empty()
                || resource.title.to_lowercase().contains(&needle)
                || resource.category.to_lowercase().contains(&needle)
                || resource.description.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .collect::<String>()
        .to_uppercase()
}

fn to_employee(seed: &EmployeeSeed) -> Employee {
    let (year, month, day) = seed.hire_date;
    Employee {
        id: seed.id.to_string(),
        name: seed.name.to_string(),
        email: seed.email.to_string(),
        phone: seed.phone.to_string(),
        department: seed.department.to_string(),
        role: seed.role,
        hire_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        position: seed.position.map(str::to_string),
        address: Some(seed.address.to_string()),
        emergency_contact: Some(seed.emergency_contact.to_string()),
        bio: Some(seed.bio.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_name_email_and_department() {
        assert_eq!(search_employees("ROLAND").len(), 1);
        assert_eq!(search_employees("rnisley").len(), 1);
        assert_eq!(search_employees("deli").len(), 2);
        assert_eq!(search_employees("").len(), EMPLOYEES.len());
        assert!(search_employees("nobody").is_empty());
    }

    #[test]
    fn meat_market_roster_has_eight_members() {
        let roster = department_employees(MEAT_MARKET);
        assert_eq!(roster.len(), 8);
        assert!(roster.iter().all(|employee| employee.position.is_some()));
    }

    #[test]
    fn find_employee_by_id() {
        let employee = find_employee("emp003").unwrap();
        assert_eq!(employee.name, "Bob Johnson");
        assert_eq!(employee.role, Role::Manager);
        assert!(find_employee("missing").is_none());
    }

    #[test]
    fn resource_tabs_filter_flags() {
        assert_eq!(search_resources("", ResourceTab::All).len(), RESOURCES.len());
        assert!(search_resources("", ResourceTab::Recent).iter().all(|r| r.is_recent));
        assert!(search_resources("", ResourceTab::Favorites).iter().all(|r| r.is_favorite));
        assert_eq!(search_resources("training", ResourceTab::Favorites).len(), 1);
    }

    #[test]
    fn initials_use_each_word() {
        assert_eq!(initials("Jane Smith"), "JS");
        assert_eq!(initials("Crystal"), "C");
    }
}

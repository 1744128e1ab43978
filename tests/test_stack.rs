use relay::deploy::{PortEntry, RestartCondition, StackFile};
use relay::error::StackError;

const SHIPPED: &str = include_str!("../deploy/stack.yml");

fn stack(yaml: &str) -> StackFile {
    StackFile::from_yaml(yaml).unwrap()
}

#[test]
fn test_shipped_stack_is_valid() {
    let stack = stack(SHIPPED);

    stack.validate().unwrap();
    assert_eq!(stack.services.len(), 2);
    assert_eq!(stack.total_replicas(), 4);

    let gateway = &stack.services["gateway"];
    assert_eq!(gateway.ports, vec![PortEntry::Text("8080:8080".to_string())]);
    assert_eq!(gateway.depends_on, vec!["backend"]);
    assert_eq!(gateway.deploy.restart_policy.condition, RestartCondition::OnFailure);
    assert_eq!(
        gateway.environment.get("BACKEND_URL").map(String::as_str),
        Some("http://backend:5000/")
    );
    assert_eq!(stack.networks["app-net"].driver.as_deref(), Some("overlay"));
}

#[test]
fn test_deploy_defaults() {
    let stack = stack("services:\n  web:\n    image: nginx\n");

    let web = &stack.services["web"];
    assert_eq!(web.deploy.replicas, 1);
    assert_eq!(web.deploy.restart_policy.condition, RestartCondition::Any);
    stack.validate().unwrap();
}

#[test]
fn test_empty_stack() {
    let err = stack("version: '3.8'\n").validate().unwrap_err();
    assert!(matches!(err, StackError::NoServices));
}

#[test]
fn test_empty_image() {
    let err = stack("services:\n  web:\n    image: ''\n").validate().unwrap_err();
    assert!(matches!(err, StackError::EmptyImage { ref service } if service == "web"));
}

#[test]
fn test_unknown_network() {
    let err = stack("services:\n  web:\n    image: nginx\n    networks: [missing]\n")
        .validate()
        .unwrap_err();
    assert!(matches!(err, StackError::UnknownNetwork { ref network, .. } if network == "missing"));
}

#[test]
fn test_invalid_port() {
    let err = stack("services:\n  web:\n    image: nginx\n    ports: ['80:http']\n")
        .validate()
        .unwrap_err();
    assert!(matches!(err, StackError::InvalidPort { .. }));
}

#[test]
fn test_duplicate_published_port() {
    let yaml = "services:\n  a:\n    image: x\n    ports: ['8080:80']\n  b:\n    image: y\n    ports: ['8080:81']\n";

    let err = stack(yaml).validate().unwrap_err();

    assert!(matches!(err, StackError::DuplicatePort { port: 8080, .. }));
}

#[test]
fn test_unpublished_ports_do_not_clash() {
    let yaml = "services:\n  a:\n    image: x\n    ports: ['80']\n  b:\n    image: y\n    ports: ['80']\n";
    stack(yaml).validate().unwrap();
}

#[test]
fn test_unknown_dependency() {
    let err = stack("services:\n  web:\n    image: nginx\n    depends_on: [db]\n")
        .validate()
        .unwrap_err();
    assert!(matches!(err, StackError::UnknownDependency { ref dependency, .. } if dependency == "db"));
}

#[test]
fn test_unknown_restart_condition_fails_to_parse() {
    let yaml = "services:\n  web:\n    image: nginx\n    deploy:\n      restart_policy:\n        condition: sometimes\n";
    assert!(matches!(StackFile::from_yaml(yaml), Err(StackError::Parse(_))));
}

#[test]
fn test_load_missing_file() {
    let err = StackFile::load(std::path::Path::new("/nonexistent/stack.yml")).unwrap_err();
    assert!(matches!(err, StackError::Read { .. }));
}

#[test]
fn test_unquoted_integer_port() {
    let stack = stack("services:\n  web:\n    image: nginx\n    ports: [5000, '8080:80']\n");

    let web = &stack.services["web"];
    assert_eq!(web.ports[0], PortEntry::Number(5000));
    stack.validate().unwrap();
}

#[test]
fn test_integer_port_out_of_range() {
    let err = stack("services:\n  web:\n    image: nginx\n    ports: [70000]\n")
        .validate()
        .unwrap_err();
    assert!(matches!(err, StackError::InvalidPort { ref spec, .. } if spec == "70000"));
}

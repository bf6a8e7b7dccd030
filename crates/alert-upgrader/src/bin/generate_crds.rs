use alert_upgrader::crd::{
    App, Catalog, CatalogTemplate, Cluster, ClusterAlert, ClusterAlertGroup, ClusterAlertRule,
    Project, ProjectAlert, ProjectAlertGroup, ProjectAlertRule,
};
use kube::CustomResourceExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

fn print_crd(kind: &str, crd: CustomResourceDefinition) -> anyhow::Result<()> {
    println!("---");
    println!("# {} CRD", kind);
    println!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Legacy alerts
    print_crd("ClusterAlert", ClusterAlert::crd())?;
    print_crd("ProjectAlert", ProjectAlert::crd())?;

    // Groups and rules
    print_crd("ClusterAlertGroup", ClusterAlertGroup::crd())?;
    print_crd("ClusterAlertRule", ClusterAlertRule::crd())?;
    print_crd("ProjectAlertGroup", ProjectAlertGroup::crd())?;
    print_crd("ProjectAlertRule", ProjectAlertRule::crd())?;

    print_crd("Cluster", Cluster::crd())?;
    print_crd("Project", Project::crd())?;
    print_crd("Catalog", Catalog::crd())?;
    print_crd("CatalogTemplate", CatalogTemplate::crd())?;
    print_crd("App", App::crd())?;
    Ok(())
}

//! IAM policy documents
//!
//! Documents are built as serde_json values and serialized at the API seam.

use serde_json::{json, Value};

/// Trust policy allowing the EKS control plane service to assume a role
pub fn eks_assume_role_document() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "eks.amazonaws.com" },
            "Action": "sts:AssumeRole"
        }]
    })
}

/// Trust policy allowing EC2 instances (worker nodes) to assume a role
pub fn ec2_assume_role_document() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "ec2.amazonaws.com" },
            "Action": "sts:AssumeRole"
        }]
    })
}

/// Full access to one bucket and its objects
pub fn s3_access_document(bucket_name: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:ListBucket"],
                "Resource": format!("arn:aws:s3:::{bucket_name}")
            },
            {
                "Effect": "Allow",
                "Action": ["s3:GetObject", "s3:PutObject", "s3:DeleteObject"],
                "Resource": format!("arn:aws:s3:::{bucket_name}/*")
            }
        ]
    })
}

/// Route53 change access for DNS automation against one hosted zone
pub fn route53_change_document(zone_id: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["route53:ChangeResourceRecordSets"],
                "Resource": format!("arn:aws:route53:::hostedzone/{zone_id}")
            },
            {
                "Effect": "Allow",
                "Action": ["route53:ListHostedZones", "route53:ListResourceRecordSets"],
                "Resource": "*"
            }
        ]
    })
}

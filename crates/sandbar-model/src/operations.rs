//! The set of S3 operations this server implements.

/// All supported S3 operations, as resolved by the request router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// The ListBuckets operation.
    ListBuckets,
    /// The CreateBucket operation.
    CreateBucket,
    /// The DeleteBucket operation.
    DeleteBucket,
    /// The HeadBucket operation.
    HeadBucket,
    /// The GetBucketLocation operation.
    GetBucketLocation,
    /// The GetBucketCors operation.
    GetBucketCors,
    /// The PutBucketCors operation.
    PutBucketCors,
    /// The DeleteBucketCors operation.
    DeleteBucketCors,
    /// The GetBucketWebsite operation.
    GetBucketWebsite,
    /// The PutBucketWebsite operation.
    PutBucketWebsite,
    /// The DeleteBucketWebsite operation.
    DeleteBucketWebsite,
    /// The GetBucketPolicy operation.
    GetBucketPolicy,
    /// The PutBucketPolicy operation.
    PutBucketPolicy,
    /// The DeleteBucketPolicy operation.
    DeleteBucketPolicy,
    /// The GetBucketLifecycleConfiguration operation.
    GetBucketLifecycle,
    /// The PutBucketLifecycleConfiguration operation.
    PutBucketLifecycle,
    /// The DeleteBucketLifecycle operation.
    DeleteBucketLifecycle,
    /// The GetBucketTagging operation.
    GetBucketTagging,
    /// The PutBucketTagging operation.
    PutBucketTagging,
    /// The DeleteBucketTagging operation.
    DeleteBucketTagging,
    /// The GetBucketAcl operation.
    GetBucketAcl,
    /// The PutBucketAcl operation.
    PutBucketAcl,
    /// The ListObjects (v1) operation.
    ListObjects,
    /// The ListObjectsV2 operation.
    ListObjectsV2,
    /// The ListMultipartUploads operation.
    ListMultipartUploads,
    /// The PutObject operation.
    PutObject,
    /// The GetObject operation.
    GetObject,
    /// The HeadObject operation.
    HeadObject,
    /// The DeleteObject operation.
    DeleteObject,
    /// The DeleteObjects (POST `?delete`) operation.
    DeleteObjects,
    /// The CopyObject operation.
    CopyObject,
    /// The PostObject (browser-based form upload) operation.
    PostObject,
    /// The GetObjectTagging operation.
    GetObjectTagging,
    /// The PutObjectTagging operation.
    PutObjectTagging,
    /// The DeleteObjectTagging operation.
    DeleteObjectTagging,
    /// The GetObjectAcl operation.
    GetObjectAcl,
    /// The PutObjectAcl operation.
    PutObjectAcl,
    /// The CreateMultipartUpload operation.
    CreateMultipartUpload,
    /// The UploadPart operation.
    UploadPart,
    /// The UploadPartCopy operation.
    UploadPartCopy,
    /// The CompleteMultipartUpload operation.
    CompleteMultipartUpload,
    /// The AbortMultipartUpload operation.
    AbortMultipartUpload,
    /// The ListParts operation.
    ListParts,
    /// A CORS preflight (OPTIONS) request against a bucket or object.
    Preflight,
}

impl S3Operation {
    /// Returns the AWS operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::CreateBucket => "CreateBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::HeadBucket => "HeadBucket",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::GetBucketCors => "GetBucketCors",
            Self::PutBucketCors => "PutBucketCors",
            Self::DeleteBucketCors => "DeleteBucketCors",
            Self::GetBucketWebsite => "GetBucketWebsite",
            Self::PutBucketWebsite => "PutBucketWebsite",
            Self::DeleteBucketWebsite => "DeleteBucketWebsite",
            Self::GetBucketPolicy => "GetBucketPolicy",
            Self::PutBucketPolicy => "PutBucketPolicy",
            Self::DeleteBucketPolicy => "DeleteBucketPolicy",
            Self::GetBucketLifecycle => "GetBucketLifecycleConfiguration",
            Self::PutBucketLifecycle => "PutBucketLifecycleConfiguration",
            Self::DeleteBucketLifecycle => "DeleteBucketLifecycle",
            Self::GetBucketTagging => "GetBucketTagging",
            Self::PutBucketTagging => "PutBucketTagging",
            Self::DeleteBucketTagging => "DeleteBucketTagging",
            Self::GetBucketAcl => "GetBucketAcl",
            Self::PutBucketAcl => "PutBucketAcl",
            Self::ListObjects => "ListObjects",
            Self::ListObjectsV2 => "ListObjectsV2",
            Self::ListMultipartUploads => "ListMultipartUploads",
            Self::PutObject => "PutObject",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
            Self::DeleteObject => "DeleteObject",
            Self::DeleteObjects => "DeleteObjects",
            Self::CopyObject => "CopyObject",
            Self::PostObject => "PostObject",
            Self::GetObjectTagging => "GetObjectTagging",
            Self::PutObjectTagging => "PutObjectTagging",
            Self::DeleteObjectTagging => "DeleteObjectTagging",
            Self::GetObjectAcl => "GetObjectAcl",
            Self::PutObjectAcl => "PutObjectAcl",
            Self::CreateMultipartUpload => "CreateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::UploadPartCopy => "UploadPartCopy",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::ListParts => "ListParts",
            Self::Preflight => "Preflight",
        }
    }

    /// Whether a successful run of this operation mutates bucket or object
    /// state. Mutating operations are the ones that publish events and are
    /// serialized per bucket.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateBucket
                | Self::DeleteBucket
                | Self::PutObject
                | Self::PostObject
                | Self::CopyObject
                | Self::DeleteObject
                | Self::DeleteObjects
                | Self::PutObjectTagging
                | Self::DeleteObjectTagging
                | Self::CompleteMultipartUpload
                | Self::AbortMultipartUpload
                | Self::UploadPart
                | Self::CreateMultipartUpload
                | Self::PutBucketCors
                | Self::DeleteBucketCors
                | Self::PutBucketWebsite
                | Self::DeleteBucketWebsite
                | Self::PutBucketPolicy
                | Self::DeleteBucketPolicy
                | Self::PutBucketLifecycle
                | Self::DeleteBucketLifecycle
                | Self::PutBucketTagging
                | Self::DeleteBucketTagging
                | Self::PutBucketAcl
                | Self::PutObjectAcl
        )
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

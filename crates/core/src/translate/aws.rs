use crate::config::{Credentials, Language, Region};
use crate::translate::{TranslateError, Translation, Translator};
use aws_sdk_translate::config::{retry::RetryConfig, BehaviorVersion};
use aws_sdk_translate::error::{DisplayErrorContext, SdkError};
use aws_sdk_translate::operation::translate_text::TranslateTextError;
use aws_sdk_translate::Client;
use futures::future::BoxFuture;
use futures::FutureExt;

const LOG_TARGET: &str = "translate::aws";
const CREDENTIALS_PROVIDER: &str = "i18n-gen-env";

/// AWS Translate backed translator.
///
/// The SDK's own retry layer is switched off; retries are driven by the
/// pipeline's call policy.
#[derive(Clone, Debug)]
pub struct AwsTranslator {
    client: Client,
}

impl AwsTranslator {
    pub fn new(credentials: &Credentials, region: &Region) -> Self {
        let credentials = aws_sdk_translate::config::Credentials::new(
            credentials.access_key_id(),
            credentials.expose_secret(),
            credentials.session_token().map(str::to_owned),
            None,
            CREDENTIALS_PROVIDER,
        );
        let config = aws_sdk_translate::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_sdk_translate::config::Region::new(region.as_str().to_owned()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .build();

        tracing::debug!(target: LOG_TARGET, region = %region.as_str(), "translate client ready");
        Self {
            client: Client::from_conf(config),
        }
    }
}

impl Translator for AwsTranslator {
    fn translate(
        &self,
        text: String,
        source: Language,
        target: Language,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
        async move {
            let output = self
                .client
                .translate_text()
                .source_language_code(source.code())
                .target_language_code(target.code())
                .text(text)
                .send()
                .await
                .map_err(classify)?;

            Ok(Translation {
                text: output.translated_text().to_owned(),
                target,
            })
        }
        .boxed()
    }
}

fn classify(err: SdkError<TranslateTextError>) -> TranslateError {
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) => TranslateError::Timeout,
        SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            TranslateError::Unavailable(message)
        }
        SdkError::ServiceError(ctx) => {
            let service = ctx.err();
            if service.is_too_many_requests_exception() {
                TranslateError::Throttled(message)
            } else if service.is_service_unavailable_exception()
                || service.is_internal_server_exception()
            {
                TranslateError::Unavailable(message)
            } else {
                TranslateError::Rejected(message)
            }
        }
        _ => TranslateError::Service(message),
    }
}

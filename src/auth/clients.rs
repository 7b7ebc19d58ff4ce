use oauth2::{basic::BasicClient, AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::{config::Config, AppResult};

type HappyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

#[derive(Clone)]
pub struct Clients {
    twitter_client: HappyClient,
}

impl Clients {
    pub fn from_config(config: &Config) -> AppResult<Clients> {
        let client_id = ClientId::new(config.twitter_client_id.clone());
        let client_secret = ClientSecret::new(config.twitter_client_secret.clone());

        let auth_url = AuthUrl::new("https://twitter.com/i/oauth2/authorize".to_string())?;
        let token_url = TokenUrl::new("https://api.twitter.com/2/oauth2/token".to_string())?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())?;

        Ok(Clients {
            twitter_client: BasicClient::new(client_id)
                .set_client_secret(client_secret)
                .set_auth_uri(auth_url)
                .set_token_uri(token_url)
                .set_redirect_uri(redirect_url),
        })
    }

    pub fn twitter(&self) -> HappyClient {
        self.twitter_client.clone()
    }
}
